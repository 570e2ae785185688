//! Format-independent drawing of a laid out diagram.
//!
//! A [`Scene`] is a flat, ordered list of primitives in canvas coordinates
//! (origin top left, y down). Every output encoding walks the same list, so
//! SVG, PNG and PDF show the same picture.

use trazo_core::{
    color::Color,
    geometry::{Point, Size},
    style::{StrokeDefinition, TextDefinition},
};

/// Length of an arrowhead along its edge.
pub const ARROW_LENGTH: f32 = 9.0;

/// Half the width of an arrowhead's base.
pub const ARROW_HALF_WIDTH: f32 = 4.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    size: Size,
    background: Option<Color>,
    items: Vec<Item>,
}

impl Scene {
    pub fn new(size: Size, background: Option<Color>) -> Self {
        Self {
            size,
            background,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: impl Into<Item>) {
        self.items.push(item.into());
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Primitives in painting order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Every distinct color used by a line that carries an arrowhead, in
    /// first-use order.
    pub fn arrow_colors(&self) -> Vec<Color> {
        let mut colors: Vec<Color> = Vec::new();
        for item in &self.items {
            if let Item::Line(line) = item {
                let color = line.stroke().color();
                if (line.start_arrow() || line.end_arrow()) && !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
        colors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Rect(Rect),
    Line(Line),
    Text(Label),
}

impl From<Rect> for Item {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<Line> for Item {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Label> for Item {
    fn from(label: Label) -> Self {
        Self::Text(label)
    }
}

/// Axis-aligned rectangle, optionally rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    top_left: Point,
    size: Size,
    fill: Option<Color>,
    stroke: Option<StrokeDefinition>,
    radius: f32,
}

impl Rect {
    pub fn new(top_left: Point, size: Size) -> Self {
        Self {
            top_left,
            size,
            fill: None,
            stroke: None,
            radius: 0.0,
        }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: StrokeDefinition) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn fill(&self) -> Option<Color> {
        self.fill
    }

    pub fn stroke(&self) -> Option<&StrokeDefinition> {
        self.stroke.as_ref()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Open polyline with optional arrowheads at either end.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    points: Vec<Point>,
    stroke: StrokeDefinition,
    start_arrow: bool,
    end_arrow: bool,
}

impl Line {
    pub fn new(points: Vec<Point>, stroke: StrokeDefinition) -> Self {
        Self {
            points,
            stroke,
            start_arrow: false,
            end_arrow: false,
        }
    }

    pub fn with_arrows(mut self, start: bool, end: bool) -> Self {
        self.start_arrow = start;
        self.end_arrow = end;
        self
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn stroke(&self) -> &StrokeDefinition {
        &self.stroke
    }

    pub fn start_arrow(&self) -> bool {
        self.start_arrow
    }

    pub fn end_arrow(&self) -> bool {
        self.end_arrow
    }

    /// Triangle of the arrowhead at the last point, if there is one.
    pub fn end_arrowhead(&self) -> Option<[Point; 3]> {
        if !self.end_arrow {
            return None;
        }
        let [.., from, tip] = self.points.as_slice() else {
            return None;
        };
        arrowhead(*from, *tip)
    }

    /// Triangle of the arrowhead at the first point, if there is one.
    pub fn start_arrowhead(&self) -> Option<[Point; 3]> {
        if !self.start_arrow {
            return None;
        }
        let [tip, from, ..] = self.points.as_slice() else {
            return None;
        };
        arrowhead(*from, *tip)
    }
}

/// Where a label's anchor point sits along its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    pub fn to_svg_value(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// A single line of text. `baseline` is the anchor point on the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    baseline: Point,
    content: String,
    text: TextDefinition,
    anchor: Anchor,
    bold: bool,
}

impl Label {
    pub fn new(baseline: Point, content: impl Into<String>, text: TextDefinition) -> Self {
        Self {
            baseline,
            content: content.into(),
            text,
            anchor: Anchor::Start,
            bold: false,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn baseline(&self) -> Point {
        self.baseline
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn text(&self) -> &TextDefinition {
        &self.text
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Left end of the text, from the measured width.
    pub fn left(&self) -> f32 {
        let width = self.text.measure(&self.content).width();
        match self.anchor {
            Anchor::Start => self.baseline.x(),
            Anchor::Middle => self.baseline.x() - width / 2.0,
            Anchor::End => self.baseline.x() - width,
        }
    }
}

/// Triangle pointing at `tip`, coming from `from`: tip, then the two base
/// corners. `None` when the two points coincide.
pub fn arrowhead(from: Point, tip: Point) -> Option<[Point; 3]> {
    let direction = tip.sub_point(from);
    let length = direction.hypot();
    if length <= f32::EPSILON {
        return None;
    }
    let unit = direction.scale(1.0 / length);
    let base = tip.sub_point(unit.scale(ARROW_LENGTH));
    let normal = Point::new(-unit.y(), unit.x()).scale(ARROW_HALF_WIDTH);
    Some([tip, base.add_point(normal), base.sub_point(normal)])
}
