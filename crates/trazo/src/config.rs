//! Configuration types for Trazo compilation.
//!
//! This module provides configuration structures that control how diagrams
//! are laid out, styled, bounded and cached. All types implement
//! [`serde::Deserialize`] for loading from external sources such as the
//! CLI's TOML file, and every field falls back to its default when absent.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`LayoutConfig`] - Engine selection threshold, spacing and force simulation settings.
//! - [`StyleConfig`] - Visual styling options such as background color and font.
//! - [`LimitsConfig`] - Input size limits checked before layout.
//! - [`CacheConfig`] - Capacity of the compiled-diagram cache.
//!
//! # Example
//!
//! ```
//! # use trazo::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.limits().max_nodes(), 500);
//! assert_eq!(config.layout().layered_threshold(), 20);
//! assert!(config.style().background_color().is_ok());
//! ```

use serde::Deserialize;

use trazo_core::color::Color;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Input limits section.
    #[serde(default)]
    limits: LimitsConfig,

    /// Result cache section.
    #[serde(default)]
    cache: CacheConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        layout: LayoutConfig,
        style: StyleConfig,
        limits: LimitsConfig,
        cache: CacheConfig,
    ) -> Self {
        Self {
            layout,
            style,
            limits,
            cache,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the input limits.
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Returns the cache configuration.
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }
}

/// Layout engine configuration.
///
/// Graphs with at most [`layered_threshold`](Self::layered_threshold) nodes
/// use the layered engine; larger graphs use the force-directed engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    layered_threshold: usize,
    force_iterations: usize,
    seed: u64,
    reduce_crossings: bool,
    node_spacing: f32,
    layer_spacing: f32,
    group_padding: f32,
    margin: f32,
    font_size: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layered_threshold: 20,
            force_iterations: 300,
            seed: 0x7A2A_50,
            reduce_crossings: false,
            node_spacing: 40.0,
            layer_spacing: 60.0,
            group_padding: 16.0,
            margin: 24.0,
            font_size: 13,
        }
    }
}

impl LayoutConfig {
    /// Largest node count laid out by the layered engine.
    pub fn layered_threshold(&self) -> usize {
        self.layered_threshold
    }

    /// Fixed iteration budget of the force simulation.
    pub fn force_iterations(&self) -> usize {
        self.force_iterations
    }

    /// Seed of the force simulation's random initial jitter.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the layered engine runs a barycenter crossing-reduction pass.
    pub fn reduce_crossings(&self) -> bool {
        self.reduce_crossings
    }

    /// Minimum gap between neighbouring nodes.
    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    /// Gap between consecutive layers of the layered engine.
    pub fn layer_spacing(&self) -> f32 {
        self.layer_spacing
    }

    /// Padding between a group's members and its border.
    pub fn group_padding(&self) -> f32 {
        self.group_padding
    }

    /// Empty space around the whole drawing.
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Base font size used to measure and draw node labels.
    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn with_layered_threshold(mut self, threshold: usize) -> Self {
        self.layered_threshold = threshold;
        self
    }

    pub fn with_force_iterations(mut self, iterations: usize) -> Self {
        self.force_iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reduce_crossings(mut self, enabled: bool) -> Self {
        self.reduce_crossings = enabled;
        self
    }
}

/// Visual styling configuration for rendered diagrams.
///
/// Fields that are not set fall back to renderer defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Background color as a CSS color string; transparent when unset.
    background_color: Option<String>,
    font_family: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            font_family: "sans-serif".to_string(),
        }
    }
}

impl StyleConfig {
    /// Creates a style with the given background color string.
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }
}

/// Input size limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    max_nodes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_nodes: 500 }
    }
}

impl LimitsConfig {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes }
    }

    /// Largest node count accepted before layout.
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }
}

/// Compiled-diagram cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

impl CacheConfig {
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }

    /// Maximum number of cached diagrams; `0` disables caching.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}
