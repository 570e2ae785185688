//! Stroke and text styling shared by layout and rendering.
//!
//! - [`StrokeDefinition`]: color, width and dash pattern of a line or border
//! - [`TextDefinition`]: font settings plus the metric used to size labels
//!
//! Text is measured without a font rasterizer: every character advances by
//! its Unicode display width times a fixed fraction of the font size. The
//! estimate is stable across platforms, which keeps layout reproducible.

use std::str::FromStr;

use unicode_width::UnicodeWidthStr;

use crate::{
    color::Color,
    geometry::{Insets, Size},
};

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// Line pattern of a stroke.
///
/// Each variant maps to an SVG `stroke-dasharray` value.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    /// 5px dash, 5px gap.
    Dashed,
    /// 2px dot, 3px gap.
    Dotted,
    /// Raw dasharray pattern such as `"10,5,2,5"`.
    Custom(String),
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            "bold" => Ok(Self::Solid),
            pattern if pattern.split(',').all(|p| p.trim().parse::<f32>().is_ok()) => {
                Ok(Self::Custom(pattern.to_string()))
            }
            other => Err(format!(
                "invalid stroke style `{other}`, valid values: solid, dashed, dotted, bold, or a dash pattern"
            )),
        }
    }
}

impl StrokeStyle {
    /// Returns the dash lengths for this style, empty for solid lines.
    pub fn dash_array(&self) -> Vec<f32> {
        match self {
            Self::Solid => Vec::new(),
            Self::Dashed => vec![5.0, 5.0],
            Self::Dotted => vec![2.0, 3.0],
            Self::Custom(pattern) => pattern
                .split(',')
                .filter_map(|p| p.trim().parse().ok())
                .collect(),
        }
    }

    /// Returns the SVG dasharray value, or `None` for solid lines.
    pub fn to_svg_value(&self) -> Option<String> {
        let dashes = self.dash_array();
        if dashes.is_empty() {
            return None;
        }
        Some(
            dashes
                .iter()
                .map(f32::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// A stroke used for node borders and edge paths.
///
/// # Examples
///
/// ```
/// use trazo_core::{color::Color, style::{StrokeDefinition, StrokeStyle}};
///
/// let mut stroke = StrokeDefinition::new(Color::new("#232f3e").unwrap(), 1.5);
/// stroke.set_style(StrokeStyle::Dashed);
/// assert_eq!(stroke.style().to_svg_value().as_deref(), Some("5,5"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    pub fn dashed(color: Color, width: f32) -> Self {
        Self {
            style: StrokeStyle::Dashed,
            ..Self::new(color, width)
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::new(Color::default(), 1.0)
    }
}

/// Font settings for a label, plus padding around it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
    color: Color,
    padding: Insets,
}

impl TextDefinition {
    pub fn new(font_family: impl Into<String>, font_size: u16) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            color: Color::default(),
            padding: Insets::default(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn padding(&self) -> Insets {
        self.padding
    }

    /// Distance between consecutive baselines.
    pub fn line_height(&self) -> f32 {
        f32::from(self.font_size) * LINE_HEIGHT_FACTOR
    }

    /// Estimates the box needed to show `content`, padding included.
    ///
    /// Multi-line content is as wide as its widest line. Empty content
    /// still reserves one line so that unlabeled boxes keep a height.
    pub fn measure(&self, content: &str) -> Size {
        let lines: Vec<&str> = content.lines().collect();
        let line_count = lines.len().max(1);
        let widest = lines.iter().map(|l| l.width()).max().unwrap_or(0);

        let advance = f32::from(self.font_size) * CHAR_WIDTH_FACTOR;
        Size::new(
            widest as f32 * advance,
            line_count as f32 * self.line_height(),
        )
        .add_padding(self.padding)
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self::new("sans-serif", 12).with_padding(Insets::uniform(4.0))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_stroke_style_from_str() {
        assert_eq!("dashed".parse::<StrokeStyle>(), Ok(StrokeStyle::Dashed));
        assert_eq!("bold".parse::<StrokeStyle>(), Ok(StrokeStyle::Solid));
        assert_eq!(
            "4, 2".parse::<StrokeStyle>(),
            Ok(StrokeStyle::Custom("4, 2".to_string()))
        );
        assert!("wavy".parse::<StrokeStyle>().is_err());
    }

    #[test]
    fn test_dash_array() {
        assert!(StrokeStyle::Solid.dash_array().is_empty());
        assert_eq!(StrokeStyle::Dotted.dash_array(), vec![2.0, 3.0]);
        assert_eq!(StrokeStyle::Solid.to_svg_value(), None);
    }

    #[test]
    fn test_measure_single_line() {
        let text = TextDefinition::new("sans-serif", 10);
        let size = text.measure("abcd");
        assert!(approx_eq!(f32, size.width(), 24.0));
        assert!(approx_eq!(f32, size.height(), 12.5));
    }

    #[test]
    fn test_measure_multiline_uses_widest() {
        let text = TextDefinition::new("sans-serif", 10);
        let size = text.measure("ab\nabcdef\nabc");
        assert!(approx_eq!(f32, size.width(), 36.0));
        assert!(approx_eq!(f32, size.height(), 37.5));
    }

    #[test]
    fn test_measure_wide_characters() {
        let text = TextDefinition::new("sans-serif", 10);
        assert!(text.measure("数据").width() > text.measure("ab").width());
    }

    #[test]
    fn test_measure_includes_padding() {
        let text = TextDefinition::new("sans-serif", 10).with_padding(Insets::uniform(5.0));
        let size = text.measure("");
        assert!(approx_eq!(f32, size.width(), 10.0));
        assert!(approx_eq!(f32, size.height(), 22.5));
    }
}
