//! Embedding an SVG image in a minimal HTML document.

use crate::error::ConversionError;

/// Drop everything before the root `<svg` element.
///
/// Graphviz output starts with an XML declaration, a DOCTYPE and a comment,
/// none of which are allowed inside an HTML body.
pub fn strip_preamble(image: &[u8]) -> Result<Vec<u8>, ConversionError> {
    let start = image
        .windows(5)
        .enumerate()
        .find(|(_, w)| {
            w[..4] == *b"<svg" && (w[4].is_ascii_whitespace() || w[4] == b'>' || w[4] == b'/')
        })
        .map(|(i, _)| i)
        .ok_or(ConversionError::MissingSvgElement)?;

    let fragment = &image[start..];
    let end = fragment
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    Ok(fragment[..end].to_vec())
}

/// Wrap an embeddable fragment in an HTML document with the given title.
pub fn wrap_document(fragment: &[u8], title: &str) -> Result<Vec<u8>, ConversionError> {
    let body = String::from_utf8(fragment.to_vec())?;
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    );
    Ok(html.into_bytes())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
