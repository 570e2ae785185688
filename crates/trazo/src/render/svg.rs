//! SVG encoding of a [`Scene`].

use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use trazo_core::{color::Color, geometry::Point};

use super::scene::{Item, Label, Line, Rect, Scene};

/// Sets the stroke attributes of an SVG element from a `StrokeDefinition`.
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}

/// Serializes `scene` as a standalone SVG document.
pub fn encode(scene: &Scene) -> Vec<u8> {
    to_document(scene).to_string().into_bytes()
}

pub fn to_document(scene: &Scene) -> Document {
    let size = scene.size();
    let mut doc = Document::new()
        .set("viewBox", format!("0 0 {} {}", size.width(), size.height()))
        .set("width", size.width())
        .set("height", size.height());

    let colors = scene.arrow_colors();
    if !colors.is_empty() {
        doc = doc.add(marker_definitions(&colors));
    }

    if let Some(background) = scene.background() {
        doc = doc.add(
            svg_element::Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", background.to_string())
                .set("fill-opacity", background.alpha()),
        );
    }

    for item in scene.items() {
        doc = match item {
            Item::Rect(rect) => doc.add(render_rect(rect)),
            Item::Line(line) => doc.add(render_line(line, &colors)),
            Item::Text(label) => doc.add(render_label(label)),
        };
    }
    doc
}

/// Creates one pair of arrowhead markers per color
fn marker_definitions(colors: &[Color]) -> svg_element::Definitions {
    let mut defs = svg_element::Definitions::new();

    for (index, color) in colors.iter().enumerate() {
        let arrow_right = svg_element::Marker::new()
            .set("id", format!("arrow-right-{index}"))
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                svg_element::Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", color.to_string()),
            );

        let arrow_left = svg_element::Marker::new()
            .set("id", format!("arrow-left-{index}"))
            .set("viewBox", "0 0 10 10")
            .set("refX", 1)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                svg_element::Path::new()
                    .set("d", "M 10 0 L 0 5 L 10 10 z")
                    .set("fill", color.to_string()),
            );

        defs = defs.add(arrow_right).add(arrow_left);
    }

    defs
}

fn render_rect(rect: &Rect) -> svg_element::Rectangle {
    let mut element = svg_element::Rectangle::new()
        .set("x", rect.top_left().x())
        .set("y", rect.top_left().y())
        .set("width", rect.size().width())
        .set("height", rect.size().height());

    if rect.radius() > 0.0 {
        element = element.set("rx", rect.radius());
    }
    element = match rect.fill() {
        Some(fill) => element
            .set("fill", fill.to_string())
            .set("fill-opacity", fill.alpha()),
        None => element.set("fill", "none"),
    };
    if let Some(stroke) = rect.stroke() {
        element = apply_stroke!(element, stroke);
    }
    element
}

/// Path data for a polyline.
fn path_data(points: &[Point]) -> String {
    let mut data = String::new();
    for (i, point) in points.iter().enumerate() {
        let command = if i == 0 { "M" } else { " L" };
        data.push_str(&format!("{command} {} {}", point.x(), point.y()));
    }
    data
}

fn render_line(line: &Line, colors: &[Color]) -> svg_element::Path {
    let path = svg_element::Path::new()
        .set("d", path_data(line.points()))
        .set("fill", "none");
    let mut path = apply_stroke!(path, line.stroke());

    let marker = colors.iter().position(|c| *c == line.stroke().color());
    if let Some(index) = marker {
        if line.start_arrow() {
            path = path.set("marker-start", format!("url(#arrow-left-{index})"));
        }
        if line.end_arrow() {
            path = path.set("marker-end", format!("url(#arrow-right-{index})"));
        }
    }
    path
}

fn render_label(label: &Label) -> svg_element::Text {
    let definition = label.text();
    let color = definition.color();
    let mut text = svg_element::Text::new("")
        .set("x", label.baseline().x())
        .set("y", label.baseline().y())
        .set("text-anchor", label.anchor().to_svg_value())
        .set("font-family", definition.font_family())
        .set("font-size", definition.font_size())
        .set("fill", color.to_string())
        .set("fill-opacity", color.alpha());
    if label.is_bold() {
        text = text.set("font-weight", "bold");
    }
    text.add(SvgText::new(label.content()))
}

#[cfg(test)]
mod tests {
    use trazo_core::{
        geometry::Size,
        style::{StrokeDefinition, TextDefinition},
    };

    use super::*;
    use crate::render::scene::Anchor;

    fn sample_scene() -> Scene {
        let red = Color::new("red").unwrap();
        let mut scene = Scene::new(Size::new(200.0, 100.0), Some(Color::new("white").unwrap()));
        scene.push(
            Rect::new(Point::new(10.0, 10.0), Size::new(50.0, 30.0))
                .with_fill(Color::new("#eeeeee").unwrap())
                .with_stroke(StrokeDefinition::dashed(Color::default(), 1.0))
                .with_radius(4.0),
        );
        scene.push(
            Line::new(
                vec![Point::new(0.0, 0.0), Point::new(0.0, 50.0), Point::new(40.0, 50.0)],
                StrokeDefinition::new(red, 1.5),
            )
            .with_arrows(true, true),
        );
        scene.push(
            Label::new(Point::new(35.0, 25.0), "a < b & c", TextDefinition::new("sans-serif", 12))
                .with_anchor(Anchor::Middle)
                .with_bold(true),
        );
        scene
    }

    #[test]
    fn test_document_structure() {
        let svg = String::from_utf8(encode(&sample_scene())).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
        assert!(svg.contains(r#"id="arrow-right-0""#));
        assert!(svg.contains("url(#arrow-left-0)"));
        assert!(svg.contains("url(#arrow-right-0)"));
        assert!(svg.contains(r#"stroke-dasharray="5,5""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"font-weight="bold""#));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = String::from_utf8(encode(&sample_scene())).unwrap();
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(!svg.contains("a < b"));
    }

    #[test]
    fn test_no_markers_without_arrows() {
        let mut scene = Scene::new(Size::new(10.0, 10.0), None);
        scene.push(Line::new(
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            StrokeDefinition::default(),
        ));
        let svg = String::from_utf8(encode(&scene)).unwrap();
        assert!(!svg.contains("<marker"));
        assert!(svg.contains(r#"d="M 0 0 L 5 5""#));
    }
}
