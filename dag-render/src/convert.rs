//! DOT to image conversion.
//!
//! The actual layout work is delegated to an external program; the
//! [`ImageConverter`] trait is the seam so tests can substitute a fake.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ConversionError;

/// Converts DOT text into image bytes.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    /// Lay out and draw the graph, returning SVG bytes.
    async fn to_image(&self, dot: &str) -> Result<Vec<u8>, ConversionError>;
}

#[async_trait]
impl<T: ImageConverter + ?Sized> ImageConverter for Arc<T> {
    async fn to_image(&self, dot: &str) -> Result<Vec<u8>, ConversionError> {
        (**self).to_image(dot).await
    }
}

/// Runs Graphviz (`dot -Tsvg`) as a subprocess.
#[derive(Debug, Clone)]
pub struct GraphvizConverter {
    program: String,
}

impl GraphvizConverter {
    /// Use the given Graphviz binary.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The binary this converter invokes.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for GraphvizConverter {
    fn default() -> Self {
        Self::new("dot")
    }
}

#[async_trait]
impl ImageConverter for GraphvizConverter {
    async fn to_image(&self, dot: &str) -> Result<Vec<u8>, ConversionError> {
        let mut child = Command::new(&self.program)
            .arg("-Tsvg")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            ConversionError::Io(std::io::Error::other("converter stdin unavailable"))
        })?;

        // Feed stdin while draining stdout so a large graph cannot fill both pipes.
        let feed = async move {
            let written = stdin.write_all(dot.as_bytes()).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(ConversionError::Exit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        if output.stdout.is_empty() {
            return Err(ConversionError::EmptyOutput);
        }

        tracing::debug!(
            "{} produced {} bytes of svg",
            self.program,
            output.stdout.len()
        );
        Ok(output.stdout)
    }
}
