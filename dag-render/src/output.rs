//! Where the rendered document is written.
//!
//! Resolution order:
//! 1. no path (or an empty one): a fresh `dag_*.html` in the system temp dir
//! 2. an existing directory: a fresh `dag_*.html` inside it
//! 3. anything else: that exact file, created or truncated

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::artifact::RenderedArtifact;
use crate::error::RenderError;

/// An opened, writable destination.
///
/// An auto-named file only survives once [`write`](Self::write) succeeds;
/// dropping the destination earlier removes it.
#[derive(Debug)]
pub struct Destination {
    path: PathBuf,
    sink: Sink,
}

#[derive(Debug)]
enum Sink {
    /// Exact path, already created or truncated.
    Exact(File),
    /// Auto-named file, deleted on drop until kept.
    Fresh(NamedTempFile),
}

impl Destination {
    /// Final path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` and return the final path.
    pub fn write(self, bytes: &[u8]) -> Result<PathBuf, RenderError> {
        let Destination { path, sink } = self;
        match sink {
            Sink::Exact(mut file) => {
                if let Err(source) = file.write_all(bytes).and_then(|()| file.flush()) {
                    return Err(RenderError::WriteFailure { path, source });
                }
            }
            Sink::Fresh(mut temp) => {
                if let Err(source) = temp.write_all(bytes).and_then(|()| temp.flush()) {
                    return Err(RenderError::WriteFailure { path, source });
                }
                if let Err(e) = temp.keep() {
                    return Err(RenderError::WriteFailure {
                        path,
                        source: e.error,
                    });
                }
            }
        }
        Ok(path)
    }
}

/// Decides and opens the output file.
#[derive(Debug, Clone)]
pub struct OutputResolver {
    prefix: String,
    suffix: String,
}

impl Default for OutputResolver {
    fn default() -> Self {
        Self {
            prefix: "dag_".into(),
            suffix: ".html".into(),
        }
    }
}

impl OutputResolver {
    /// Open the destination for `requested`.
    pub fn resolve(&self, requested: Option<&Path>) -> Result<Destination, RenderError> {
        match requested.filter(|p| !p.as_os_str().is_empty()) {
            None => self.unique_in(&std::env::temp_dir()),
            Some(path) if path.is_dir() => self.unique_in(path),
            Some(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|source| RenderError::DestinationUnavailable {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(Destination {
                    path: path.to_path_buf(),
                    sink: Sink::Exact(file),
                })
            }
        }
    }

    /// Resolve the destination and write the artifact to it.
    ///
    /// Returns the final path.
    pub fn persist(
        &self,
        artifact: &RenderedArtifact,
        requested: Option<&Path>,
    ) -> Result<PathBuf, RenderError> {
        let path = self.resolve(requested)?.write(artifact.bytes())?;
        tracing::info!(
            "Saved {} bytes of {} to {}",
            artifact.len(),
            artifact.format(),
            path.display()
        );
        Ok(path)
    }

    fn unique_in(&self, dir: &Path) -> Result<Destination, RenderError> {
        let temp = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(&self.suffix)
            .tempfile_in(dir)
            .map_err(|source| RenderError::DestinationUnavailable {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Destination {
            path: temp.path().to_path_buf(),
            sink: Sink::Fresh(temp),
        })
    }
}
