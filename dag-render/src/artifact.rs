//! Immutable output of one rendering stage.

use std::fmt;

/// What a [`RenderedArtifact`] contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Graphviz DOT description.
    Dot,
    /// SVG image.
    Svg,
    /// HTML document.
    Html,
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::Dot => write!(f, "dot"),
            ArtifactFormat::Svg => write!(f, "svg"),
            ArtifactFormat::Html => write!(f, "html"),
        }
    }
}

/// Bytes tagged with their format.
///
/// Never mutated after creation; the next stage builds a new artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    format: ArtifactFormat,
    bytes: Vec<u8>,
}

impl RenderedArtifact {
    /// Tag bytes with a format.
    pub fn new(format: ArtifactFormat, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }

    /// Format of the contained bytes.
    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    /// The contained bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the artifact holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
