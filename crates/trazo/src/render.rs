//! Rendering of laid out diagrams.
//!
//! [`build_scene`] turns a graph and its layout into a [`Scene`], a flat
//! list of vector primitives. [`encode`] serializes a scene into one of the
//! [`OutputFormat`]s. Encoding never lays anything out again: PNG is the
//! scene's SVG rasterized, PDF is the same primitives written as PDF
//! drawing operators.

mod build;
mod pdf;
mod png;
pub mod scene;
mod svg;

pub use build::build_scene;
pub use scene::Scene;

use std::{fmt, path::Path, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while building or encoding a scene.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid attribute: {0}")]
    Attribute(String),

    #[error("rasterization failed: {0}")]
    Raster(String),

    #[error("failed to write PDF")]
    Pdf(#[from] fmt::Error),
}

/// Image encoding of a compiled diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Svg, Self::Png, Self::Pdf];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// Infers the format from a file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown output format `{s}`, expected one of: svg, png, pdf"))
    }
}

/// Serializes `scene` in `format`.
///
/// # Errors
///
/// Returns a [`RenderError`] if rasterization or PDF serialization fails.
/// SVG encoding cannot fail.
pub fn encode(scene: &Scene, format: OutputFormat) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Svg => Ok(svg::encode(scene)),
        OutputFormat::Png => png::encode(scene),
        OutputFormat::Pdf => pdf::encode(scene),
    }
}
