//! Shared fixtures: stand-in converters and small run configs.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dag_harness::RunConfig;
use dag_render::{ConversionError, ImageConverter};

/// An SVG with the preamble Graphviz puts in front of its output.
pub const GRAPHVIZ_LIKE_SVG: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN"
 "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<!-- Generated by fake converter -->
<svg width="8pt" height="8pt" xmlns="http://www.w3.org/2000/svg">
<g id="graph0" class="graph"><title>dag</title></g>
</svg>
"#;

/// Converter that answers every request with [`GRAPHVIZ_LIKE_SVG`] and
/// remembers the last DOT description it was given.
#[derive(Debug, Default)]
pub struct FakeSvgConverter {
    last_dot: Mutex<Option<String>>,
}

impl FakeSvgConverter {
    /// The DOT text of the most recent conversion.
    pub fn last_dot(&self) -> Option<String> {
        self.last_dot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ImageConverter for FakeSvgConverter {
    async fn to_image(&self, dot: &str) -> Result<Vec<u8>, ConversionError> {
        *self.last_dot.lock().unwrap_or_else(PoisonError::into_inner) = Some(dot.to_string());
        Ok(GRAPHVIZ_LIKE_SVG.as_bytes().to_vec())
    }
}

/// Converter that panics mid-render.
#[derive(Debug, Default)]
pub struct PanickingConverter;

#[async_trait]
impl ImageConverter for PanickingConverter {
    async fn to_image(&self, _dot: &str) -> Result<Vec<u8>, ConversionError> {
        panic!("converter panicked mid-render")
    }
}

/// Converter that always fails like a missing binary.
#[derive(Debug, Default)]
pub struct MissingBinaryConverter;

#[async_trait]
impl ImageConverter for MissingBinaryConverter {
    async fn to_image(&self, _dot: &str) -> Result<Vec<u8>, ConversionError> {
        Err(ConversionError::Spawn {
            program: "dot".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }
}

/// Default config resized to `nodes` x `blocks`.
pub fn config(nodes: usize, blocks: u32) -> RunConfig {
    let mut config = RunConfig::default();
    config.cluster.nodes = nodes;
    config.cluster.blocks_per_node = blocks;
    config
}
