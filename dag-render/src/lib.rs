//! # dag-render
//!
//! Turns a canonical [`DagGraph`](dag_core::DagGraph) into a single HTML
//! document and writes it to disk.
//!
//! ## Pipeline
//!
//! ```text
//! DagGraph ──describe──► DOT text ──ImageConverter──► SVG
//!                                                      │
//!            HTML ◄──wrap_document── fragment ◄──strip_preamble
//! ```
//!
//! Each stage produces a new [`RenderedArtifact`]; a failing stage aborts
//! the pipeline with [`RenderError::Conversion`] naming the stage. No
//! partial artifact is ever returned.
//!
//! [`OutputResolver`] then decides where the document lands: a fresh
//! `dag_*.html` in the temp dir, a fresh file inside a given directory, or
//! an exact path.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod convert;
pub mod document;
pub mod dot;
pub mod error;
pub mod output;
pub mod renderer;

pub use artifact::{ArtifactFormat, RenderedArtifact};
pub use convert::{GraphvizConverter, ImageConverter};
pub use document::{strip_preamble, wrap_document};
pub use dot::describe;
pub use error::{ConversionError, RenderError, Stage};
pub use output::{Destination, OutputResolver};
pub use renderer::GraphRenderer;
