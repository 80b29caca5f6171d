//! Error types for rendering and output.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage, used to give conversion failures context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Graph to DOT text.
    Describe,
    /// DOT text to SVG image.
    Image,
    /// SVG image to embeddable fragment.
    Embed,
    /// Fragment to HTML document.
    Document,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Describe => write!(f, "describe"),
            Stage::Image => write!(f, "image"),
            Stage::Embed => write!(f, "embed"),
            Stage::Document => write!(f, "document"),
        }
    }
}

/// Why a single conversion stage failed.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The graph has no blocks.
    #[error("graph is empty")]
    EmptyGraph,

    /// The converter process could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The converter process exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        /// Program that was invoked.
        program: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The converter produced no output.
    #[error("converter produced no output")]
    EmptyOutput,

    /// The image has no `<svg>` element to embed.
    #[error("no <svg> element found in image")]
    MissingSvgElement,

    /// The fragment is not valid UTF-8.
    #[error("fragment is not valid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// I/O with the converter process failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from rendering a graph or persisting the document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A conversion stage failed.
    #[error("conversion failed at {stage} stage: {source}")]
    Conversion {
        /// Stage that failed.
        stage: Stage,
        /// Underlying failure.
        source: ConversionError,
    },

    /// The output destination could not be created or opened.
    #[error("failed to create output file-handle for {path}: {source}")]
    DestinationUnavailable {
        /// Requested path (or the directory a file was to be created in).
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the document failed.
    #[error("failed to save html file {path}: {source}")]
    WriteFailure {
        /// Resolved destination.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl RenderError {
    /// Wrap a conversion failure with its stage.
    pub fn conversion(stage: Stage, source: impl Into<ConversionError>) -> Self {
        RenderError::Conversion {
            stage,
            source: source.into(),
        }
    }

    /// The failing stage, for conversion errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RenderError::Conversion { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
