//! Icon optimization pass.
//!
//! The normalizer accepts any [`Optimizer`]. The bundled [`UsvgOptimizer`]
//! parses the icon with usvg and writes the simplified tree back out,
//! which resolves `use`/CSS/transforms into plain paths.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Options forwarded to the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    /// Run the optimizer at all.
    pub enabled: bool,
    /// DPI used when resolving absolute units.
    pub dpi: f32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            dpi: 96.0,
        }
    }
}

/// A markup-to-markup shape optimization pass.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, markup: &str, options: &OptimizeOptions) -> Result<String>;
}

/// Optimizer backed by usvg.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsvgOptimizer;

impl Optimizer for UsvgOptimizer {
    fn optimize(&self, markup: &str, options: &OptimizeOptions) -> Result<String> {
        let usvg_options = usvg::Options {
            dpi: options.dpi,
            ..Default::default()
        };

        let tree = usvg::Tree::from_str(markup, &usvg_options).context("Failed to parse SVG")?;

        let write_options = usvg::WriteOptions {
            indent: usvg::Indent::None,
            ..Default::default()
        };

        Ok(tree.to_string(&write_options))
    }
}
