//! Graph to HTML document pipeline.

use dag_core::DagGraph;

use crate::artifact::{ArtifactFormat, RenderedArtifact};
use crate::convert::ImageConverter;
use crate::document::{strip_preamble, wrap_document};
use crate::dot::describe;
use crate::error::{ConversionError, RenderError, Stage};

/// Renders a [`DagGraph`] as an HTML document embedding an SVG drawing.
#[derive(Debug, Clone)]
pub struct GraphRenderer<C> {
    converter: C,
    title: String,
}

impl<C: ImageConverter> GraphRenderer<C> {
    /// Create a renderer that titles documents with `title`.
    pub fn new(converter: C, title: impl Into<String>) -> Self {
        Self {
            converter,
            title: title.into(),
        }
    }

    /// Run every stage, returning the finished HTML document.
    pub async fn render(&self, graph: &DagGraph) -> Result<RenderedArtifact, RenderError> {
        let dot = self.describe(graph)?;
        let image = self.image(&dot).await?;
        let fragment = Self::embed(&image)?;
        self.document(&fragment)
    }

    /// Stage 1: graph to DOT text.
    pub fn describe(&self, graph: &DagGraph) -> Result<RenderedArtifact, RenderError> {
        if graph.is_empty() {
            return Err(RenderError::conversion(
                Stage::Describe,
                ConversionError::EmptyGraph,
            ));
        }
        let dot = describe(graph);
        tracing::debug!(
            "Described {} blocks as {} bytes of dot",
            graph.len(),
            dot.len()
        );
        Ok(RenderedArtifact::new(ArtifactFormat::Dot, dot))
    }

    /// Stage 2: DOT text to SVG.
    pub async fn image(&self, dot: &RenderedArtifact) -> Result<RenderedArtifact, RenderError> {
        let text = String::from_utf8(dot.bytes().to_vec())
            .map_err(|e| RenderError::conversion(Stage::Image, e))?;
        let svg = self
            .converter
            .to_image(&text)
            .await
            .map_err(|e| RenderError::conversion(Stage::Image, e))?;
        Ok(RenderedArtifact::new(ArtifactFormat::Svg, svg))
    }

    /// Stage 3: SVG to an embeddable fragment.
    pub fn embed(image: &RenderedArtifact) -> Result<RenderedArtifact, RenderError> {
        let fragment =
            strip_preamble(image.bytes()).map_err(|e| RenderError::conversion(Stage::Embed, e))?;
        Ok(RenderedArtifact::new(ArtifactFormat::Svg, fragment))
    }

    /// Stage 4: fragment to HTML document.
    pub fn document(&self, fragment: &RenderedArtifact) -> Result<RenderedArtifact, RenderError> {
        let html = wrap_document(fragment.bytes(), &self.title)
            .map_err(|e| RenderError::conversion(Stage::Document, e))?;
        Ok(RenderedArtifact::new(ArtifactFormat::Html, html))
    }
}
