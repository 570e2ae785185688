//! Turns a graph and its layout into a [`Scene`].

use log::debug;

use trazo_core::{
    color::Color,
    geometry::{Bounds, Point, Size},
    graph::{Edge, Graph, Node, NodeCategory, RelationKind},
    style::{StrokeDefinition, StrokeStyle, TextDefinition},
};

use super::{
    RenderError,
    scene::{Anchor, Label, Line, Rect, Scene},
};
use crate::{
    config::StyleConfig,
    layout::{LayoutResult, NodeContent, Typography},
};

const DEFAULT_BACKGROUND: &str = "white";
const GROUP_FILL: &str = "#f5f7fa";
const GROUP_STROKE: &str = "#8795a1";
const EDGE_STROKE: &str = "#4a5568";
const CONTAINMENT_STROKE: &str = "#a0aec0";
const TEXT_COLOR: &str = "#1a202c";
const MUTED_TEXT_COLOR: &str = "#5a6778";
const TABLE_HEADER_FILL: &str = "#dde6f0";

const EDGE_WIDTH: f32 = 1.5;
const BOLD_EDGE_WIDTH: f32 = 2.5;
const TITLE_GAP: f32 = 12.0;

/// Fill, border and corner radius of a node box.
struct NodeStyle {
    fill: &'static str,
    stroke: &'static str,
    radius: f32,
}

fn node_style(category: NodeCategory) -> NodeStyle {
    match category {
        NodeCategory::Service => NodeStyle {
            fill: "#eaf2fb",
            stroke: "#232f3e",
            radius: 6.0,
        },
        NodeCategory::Table => NodeStyle {
            fill: "#ffffff",
            stroke: "#4a5568",
            radius: 0.0,
        },
        NodeCategory::Container => NodeStyle {
            fill: "#fdf6e3",
            stroke: "#8a6d3b",
            radius: 4.0,
        },
        NodeCategory::Value => NodeStyle {
            fill: "#f4f4f4",
            stroke: "#7a7a7a",
            radius: 4.0,
        },
    }
}

fn parse_color(value: &str) -> Result<Color, RenderError> {
    Color::new(value).map_err(RenderError::Attribute)
}

/// Font definitions for every kind of text in the drawing.
struct Fonts {
    title: TextDefinition,
    detail: TextDefinition,
    row: TextDefinition,
    heading: TextDefinition,
}

impl Fonts {
    fn new(typography: &Typography, family: &str) -> Result<Self, RenderError> {
        let text = parse_color(TEXT_COLOR)?;
        let muted = parse_color(MUTED_TEXT_COLOR)?;
        Ok(Self {
            title: TextDefinition::new(family, typography.title().font_size()).with_color(text),
            detail: TextDefinition::new(family, typography.detail().font_size()).with_color(muted),
            row: TextDefinition::new(family, typography.row().font_size()).with_color(text),
            heading: TextDefinition::new(family, typography.title().font_size() + 4).with_color(text),
        })
    }
}

/// Baseline of a line of text whose line box starts at `top`.
fn baseline(top: f32, text: &TextDefinition) -> f32 {
    top + text.line_height() / 2.0 + f32::from(text.font_size()) * 0.35
}

/// Builds the scene for `graph` laid out as `layout`.
///
/// Painting order is groups (outermost first), edges, nodes, then edge
/// labels, so labels stay readable where they cross other lines.
///
/// # Errors
///
/// Returns [`RenderError::Attribute`] if a color or stroke attribute cannot
/// be interpreted.
pub fn build_scene(
    graph: &Graph,
    layout: &LayoutResult,
    style: &StyleConfig,
) -> Result<Scene, RenderError> {
    let fonts = Fonts::new(layout.typography(), style.font_family())?;
    let background = style
        .background_color()
        .map_err(RenderError::Attribute)?
        .unwrap_or(parse_color(DEFAULT_BACKGROUND)?);

    let canvas = layout.canvas();
    let (title_band, title_width) = match graph.title() {
        Some(title) => (
            fonts.heading.line_height() + TITLE_GAP,
            fonts.heading.measure(title).width() + 2.0 * TITLE_GAP,
        ),
        None => (0.0, 0.0),
    };
    let size = Size::new(canvas.width().max(title_width), canvas.height() + title_band);
    let shift = Point::new(0.0, title_band);

    let mut scene = Scene::new(size, Some(background));

    if let Some(title) = graph.title() {
        let y = baseline(TITLE_GAP, &fonts.heading);
        scene.push(
            Label::new(Point::new(size.width() / 2.0, y), title, fonts.heading.clone())
                .with_anchor(Anchor::Middle)
                .with_bold(true),
        );
    }

    let group_fill = parse_color(GROUP_FILL)?;
    let group_stroke = StrokeDefinition::dashed(parse_color(GROUP_STROKE)?, 1.0);
    let inset = NodeContent::padding();
    for (id, group) in graph.groups() {
        let Some(bounds) = layout.group_bounds(id) else {
            continue;
        };
        let bounds = bounds.translate(shift);
        scene.push(
            Rect::new(bounds.min_point(), bounds.to_size())
                .with_fill(group_fill)
                .with_stroke(group_stroke.clone())
                .with_radius(8.0),
        );
        let y = baseline(bounds.min_y() + 2.0, &fonts.detail);
        scene.push(
            Label::new(Point::new(bounds.min_x() + inset.left(), y), group.label(), fonts.detail.clone())
                .with_bold(true),
        );
    }

    let mut edge_labels = Vec::new();
    for (id, edge) in graph.edges() {
        let points: Vec<Point> = layout.route(id).iter().map(|p| p.add_point(shift)).collect();
        if let Some(label) = edge.label().filter(|l| !l.is_empty()) {
            edge_labels.push((label_anchor(&points), label));
        }
        let stroke = edge_stroke(edge)?;
        let bidirectional = edge.attribute("bidirectional") == Some("true");
        scene.push(
            Line::new(points, stroke).with_arrows(
                edge.is_directed() && bidirectional,
                edge.is_directed(),
            ),
        );
    }

    for (id, node) in graph.nodes() {
        draw_node(&mut scene, node, layout.node_bounds(id).translate(shift), layout.typography(), &fonts)?;
    }

    for (anchor, label) in edge_labels {
        let measured = fonts.detail.measure(label);
        let top_left = Point::new(
            anchor.x() - measured.width() / 2.0 - 2.0,
            anchor.y() - measured.height() / 2.0,
        );
        scene.push(
            Rect::new(top_left, Size::new(measured.width() + 4.0, measured.height()))
                .with_fill(background)
                .with_radius(3.0),
        );
        let y = baseline(top_left.y(), &fonts.detail);
        scene.push(
            Label::new(Point::new(anchor.x(), y), label, fonts.detail.clone()).with_anchor(Anchor::Middle),
        );
    }

    debug!(items = scene.items().len(), width = size.width(), height = size.height(); "Scene built");
    Ok(scene)
}

/// Stroke of an edge from its relation and its `color`/`style` attributes.
fn edge_stroke(edge: &Edge) -> Result<StrokeDefinition, RenderError> {
    let default_color = match edge.relation() {
        RelationKind::Containment => CONTAINMENT_STROKE,
        RelationKind::Flow | RelationKind::ForeignKey => EDGE_STROKE,
    };
    let color = parse_color(edge.attribute("color").unwrap_or(default_color))?;

    let mut stroke = StrokeDefinition::new(color, EDGE_WIDTH);
    if let Some(style) = edge.attribute("style") {
        if style == "bold" {
            stroke.set_width(BOLD_EDGE_WIDTH);
        }
        stroke.set_style(style.parse::<StrokeStyle>().map_err(RenderError::Attribute)?);
    }
    Ok(stroke)
}

/// Midpoint of the middle segment of a route.
fn label_anchor(points: &[Point]) -> Point {
    match points.len() {
        0 => Point::default(),
        1 => points[0],
        len => {
            let segment = (len - 2) / 2;
            points[segment].midpoint(points[segment + 1])
        }
    }
}

fn draw_node(
    scene: &mut Scene,
    node: &Node,
    bounds: Bounds,
    typography: &Typography,
    fonts: &Fonts,
) -> Result<(), RenderError> {
    let style = node_style(node.category());
    let content = NodeContent::of(node);
    let border = StrokeDefinition::new(parse_color(style.stroke)?, 1.2);

    scene.push(
        Rect::new(bounds.min_point(), bounds.to_size())
            .with_fill(parse_color(style.fill)?)
            .with_stroke(border.clone())
            .with_radius(style.radius),
    );

    // A node without rows centres its header in the whole box.
    let header_height = if content.rows().is_empty() {
        bounds.height()
    } else {
        content.header_height(typography)
    };

    if node.category() == NodeCategory::Table {
        let fill = parse_color(node.attribute("bgcolor").unwrap_or(TABLE_HEADER_FILL))?;
        scene.push(
            Rect::new(bounds.min_point(), Size::new(bounds.width(), header_height))
                .with_fill(fill)
                .with_stroke(border.clone()),
        );
    }

    let title_font = match node.attribute("color") {
        Some(color) => fonts.title.clone().with_color(parse_color(color)?),
        None => fonts.title.clone(),
    };
    let mut block_height = title_font.line_height();
    if content.detail().is_some() {
        block_height += fonts.detail.line_height();
    }
    let center_x = bounds.center().x();
    let mut top = bounds.min_y() + (header_height - block_height) / 2.0;

    scene.push(
        Label::new(Point::new(center_x, baseline(top, &title_font)), content.title(), title_font.clone())
            .with_anchor(Anchor::Middle)
            .with_bold(true),
    );
    top += title_font.line_height();
    if let Some(detail) = content.detail() {
        scene.push(
            Label::new(Point::new(center_x, baseline(top, &fonts.detail)), detail, fonts.detail.clone())
                .with_anchor(Anchor::Middle),
        );
    }

    if content.rows().is_empty() {
        return Ok(());
    }

    let padding = NodeContent::padding();
    let separator = bounds.min_y() + header_height;
    if node.category() != NodeCategory::Table {
        scene.push(Line::new(
            vec![Point::new(bounds.min_x(), separator), Point::new(bounds.max_x(), separator)],
            border,
        ));
    }

    let mut top = separator + padding.top();
    for (row, field) in content.rows().iter().zip(node.fields()) {
        scene.push(
            Label::new(
                Point::new(bounds.min_x() + padding.left(), baseline(top, &fonts.row)),
                row.as_str(),
                fonts.row.clone(),
            )
            .with_bold(field.is_primary_key()),
        );
        top += fonts.row.line_height();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use trazo_core::graph::Field;

    use super::*;
    use crate::{CancellationToken, config::LayoutConfig, layout::layout, render::scene::Item};

    fn laid_out(graph: &Graph) -> LayoutResult {
        layout(graph, &LayoutConfig::default(), &CancellationToken::new()).unwrap()
    }

    fn labels(scene: &Scene) -> Vec<&str> {
        scene
            .items()
            .iter()
            .filter_map(|item| match item {
                Item::Text(label) => Some(label.content()),
                _ => None,
            })
            .collect()
    }

    fn lines(scene: &Scene) -> Vec<&Line> {
        scene
            .items()
            .iter()
            .filter_map(|item| match item {
                Item::Line(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_directed_edge_has_end_arrow() {
        let mut graph = Graph::new();
        let a = graph.add_node(Node::new("a", "a", NodeCategory::Service)).unwrap();
        let b = graph.add_node(Node::new("b", "b", NodeCategory::Service)).unwrap();
        graph.add_edge(a, b, RelationKind::Flow).unwrap();
        graph
            .add_edge(b, a, RelationKind::Flow)
            .unwrap()
            .set_attribute("bidirectional", "true");
        graph.add_edge(a, b, RelationKind::Flow).unwrap().set_directed(false);

        let scene = build_scene(&graph, &laid_out(&graph), &StyleConfig::default()).unwrap();
        let arrows: Vec<(bool, bool)> = lines(&scene)
            .iter()
            .map(|line| (line.start_arrow(), line.end_arrow()))
            .collect();
        assert_eq!(arrows, vec![(false, true), (true, true), (false, false)]);
    }

    #[test]
    fn test_edge_color_and_style_attributes() {
        let mut graph = Graph::new();
        let a = graph.add_node(Node::new("a", "a", NodeCategory::Service)).unwrap();
        let b = graph.add_node(Node::new("b", "b", NodeCategory::Service)).unwrap();
        graph
            .add_edge(a, b, RelationKind::Flow)
            .unwrap()
            .set_attribute("color", "firebrick")
            .set_attribute("style", "dashed");

        let scene = build_scene(&graph, &laid_out(&graph), &StyleConfig::default()).unwrap();
        let line = lines(&scene)[0];
        assert_eq!(line.stroke().color(), Color::new("firebrick").unwrap());
        assert_eq!(line.stroke().style(), &StrokeStyle::Dashed);
    }

    #[test]
    fn test_invalid_edge_color_is_an_error() {
        let mut graph = Graph::new();
        let a = graph.add_node(Node::new("a", "a", NodeCategory::Service)).unwrap();
        graph
            .add_edge(a, a, RelationKind::Flow)
            .unwrap()
            .set_attribute("color", "not a color");

        let result = build_scene(&graph, &laid_out(&graph), &StyleConfig::default());
        assert!(matches!(result, Err(RenderError::Attribute(_))));
    }

    #[test]
    fn test_text_content() {
        let mut graph = Graph::new();
        graph.set_title("Shop");
        let group = graph.add_group("Backend", None).unwrap();
        let users = graph
            .add_node(
                Node::new("users", "users", NodeCategory::Table)
                    .with_field(Field::new("id").with_primary_key(true))
                    .with_group(Some(group)),
            )
            .unwrap();
        let posts = graph.add_node(Node::new("posts", "posts", NodeCategory::Table)).unwrap();
        graph
            .add_edge(posts, users, RelationKind::ForeignKey)
            .unwrap()
            .set_label("one-to-many");

        let scene = build_scene(&graph, &laid_out(&graph), &StyleConfig::default()).unwrap();
        let texts = labels(&scene);
        for expected in ["Shop", "Backend", "users", "PK id", "posts", "one-to-many"] {
            assert!(texts.contains(&expected), "missing {expected} in {texts:?}");
        }
    }

    #[test]
    fn test_title_band_grows_the_scene() {
        let mut graph = Graph::new();
        graph.add_node(Node::new("a", "a", NodeCategory::Value)).unwrap();
        let layout = laid_out(&graph);
        let plain = build_scene(&graph, &layout, &StyleConfig::default()).unwrap();

        graph.set_title("A title");
        let titled = build_scene(&graph, &layout, &StyleConfig::default()).unwrap();
        assert_eq!(plain.size(), layout.canvas().to_size());
        assert!(titled.size().height() > plain.size().height());
    }

    #[test]
    fn test_background_from_config() {
        let mut graph = Graph::new();
        graph.add_node(Node::new("a", "a", NodeCategory::Value)).unwrap();
        let style = StyleConfig::default().with_background_color("#102030");
        let scene = build_scene(&graph, &laid_out(&graph), &style).unwrap();
        assert_eq!(scene.background(), Some(Color::new("#102030").unwrap()));
    }

    #[test]
    fn test_label_anchor_uses_middle_segment() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(20.0, 10.0),
            Point::new(20.0, 30.0),
        ];
        assert_eq!(label_anchor(&points), Point::new(10.0, 10.0));
        assert_eq!(label_anchor(&points[..2]), Point::new(0.0, 5.0));
    }
}
