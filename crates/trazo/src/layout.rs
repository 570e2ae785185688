//! Layout of a diagram graph.
//!
//! [`layout`] sizes every node from its text, places the nodes with one of
//! two engines, routes the edges and wraps groups around their members:
//!
//! - graphs with at most [`LayoutConfig::layered_threshold`] nodes use the
//!   layered engine, which follows edge direction;
//! - larger graphs use a seeded force-directed simulation.
//!
//! Both engines leave every pair of node boxes disjoint. The result is
//! translated so that the canvas starts at the origin.

mod force;
mod layered;
pub(crate) mod measure;
mod routing;

pub use measure::{NodeContent, Typography};

use log::{debug, info};
use thiserror::Error;

use trazo_core::{
    geometry::{Bounds, Insets, Point, Size},
    graph::{EdgeId, Graph, GroupId, NodeId},
};

use crate::{CancellationToken, config::LayoutConfig};

/// Errors raised while laying out a graph.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout was cancelled")]
    Cancelled,

    #[error("cycle through node {0} survived back-edge reversal")]
    Cycle(NodeId),

    #[error("node {0} was placed at a non-finite position")]
    NonFinite(NodeId),
}

/// Which engine placed the nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Layered,
    Force,
}

/// Positions of everything in a diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    engine: Engine,
    typography: Typography,
    nodes: Vec<Bounds>,
    routes: Vec<Vec<Point>>,
    groups: Vec<Option<Bounds>>,
    canvas: Bounds,
}

impl LayoutResult {
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Text definitions the node sizes were measured with.
    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    pub fn node_bounds(&self, id: NodeId) -> Bounds {
        self.nodes[id.index()]
    }

    /// All node boxes, indexed like the graph's nodes.
    pub fn nodes(&self) -> &[Bounds] {
        &self.nodes
    }

    /// Polyline of an edge, from source border to target border.
    pub fn route(&self, id: EdgeId) -> &[Point] {
        &self.routes[id.index()]
    }

    /// Box around a group's members, or `None` for an empty group.
    pub fn group_bounds(&self, id: GroupId) -> Option<Bounds> {
        self.groups[id.index()]
    }

    /// Extent of the whole drawing, margin included. Starts at the origin.
    pub fn canvas(&self) -> Bounds {
        self.canvas
    }
}

/// Lays out `graph`.
///
/// # Errors
///
/// Returns [`LayoutError::Cancelled`] if `cancel` fires, or another
/// [`LayoutError`] if an engine produced an unusable placement.
pub fn layout(
    graph: &Graph,
    config: &LayoutConfig,
    cancel: &CancellationToken,
) -> Result<LayoutResult, LayoutError> {
    let typography = Typography::new(config.font_size());
    let sizes: Vec<Size> = graph
        .nodes()
        .map(|(_, node)| NodeContent::of(node).size(&typography))
        .collect();

    let (engine, centers) = if graph.node_count() <= config.layered_threshold() {
        let mut engine = layered::Engine::new();
        engine
            .set_node_spacing(config.node_spacing())
            .set_layer_spacing(config.layer_spacing())
            .set_group_padding(config.group_padding())
            .set_group_header(typography.group_label_height())
            .set_reduce_crossings(config.reduce_crossings());
        (Engine::Layered, engine.calculate(graph, &sizes, cancel)?)
    } else {
        let mut engine = force::Engine::new();
        engine
            .set_iterations(config.force_iterations())
            .set_seed(config.seed())
            .set_min_distance(config.node_spacing());
        (Engine::Force, engine.calculate(graph, &sizes, cancel)?)
    };
    info!(engine:? = engine, nodes = graph.node_count(); "Placed nodes");

    let mut nodes = Vec::with_capacity(sizes.len());
    for ((id, _), (center, size)) in graph.nodes().zip(centers.into_iter().zip(sizes)) {
        if !center.x().is_finite() || !center.y().is_finite() {
            return Err(LayoutError::NonFinite(id));
        }
        nodes.push(Bounds::new_from_center(center, size));
    }

    if cancel.is_cancelled() {
        return Err(LayoutError::Cancelled);
    }
    let groups = group_bounds(graph, &nodes, config.group_padding(), &typography);
    let routes = routing::route_edges(graph, &nodes);
    debug!(edges = routes.len(), groups = groups.len(); "Routed edges");

    let mut result = LayoutResult {
        engine,
        typography,
        nodes,
        routes,
        groups,
        canvas: Bounds::default(),
    };
    result.fit_canvas(config.margin());
    Ok(result)
}

impl LayoutResult {
    /// Computes the canvas around all content and moves it to the origin.
    fn fit_canvas(&mut self, margin: f32) {
        let content = self
            .nodes
            .iter()
            .copied()
            .chain(self.groups.iter().flatten().copied())
            .chain(
                self.routes
                    .iter()
                    .flatten()
                    .map(|p| Bounds::new_from_center(*p, Size::default())),
            )
            .reduce(|acc, b| acc.merge(&b))
            .unwrap_or_default();

        let canvas = content.add_padding(Insets::uniform(margin));
        let offset = Point::default().sub_point(canvas.min_point());

        for bounds in &mut self.nodes {
            *bounds = bounds.translate(offset);
        }
        for bounds in self.groups.iter_mut().flatten() {
            *bounds = bounds.translate(offset);
        }
        for point in self.routes.iter_mut().flatten() {
            *point = point.add_point(offset);
        }
        self.canvas = canvas.translate(offset);
    }
}

/// Wraps each group around its members and nested groups.
///
/// Children are created after their parents, so walking groups in reverse
/// creation order sees every nested group before its parent.
fn group_bounds(
    graph: &Graph,
    nodes: &[Bounds],
    padding: f32,
    typography: &Typography,
) -> Vec<Option<Bounds>> {
    let insets = Insets::new(
        padding + typography.group_label_height(),
        padding,
        padding,
        padding,
    );
    let groups: Vec<GroupId> = graph.groups().map(|(id, _)| id).collect();
    let mut bounds: Vec<Option<Bounds>> = vec![None; groups.len()];

    for &group in groups.iter().rev() {
        let members = graph
            .nodes()
            .filter(|(id, _)| graph.is_member(*id, group))
            .map(|(id, _)| nodes[id.index()]);
        let children = groups
            .iter()
            .filter(|child| graph.group(**child).parent() == Some(group))
            .filter_map(|child| bounds[child.index()]);

        bounds[group.index()] = members
            .chain(children)
            .reduce(|acc, b| acc.merge(&b))
            .map(|b| b.add_padding(insets));
    }
    bounds
}

#[cfg(test)]
mod tests {
    use trazo_core::graph::{Node, NodeCategory, RelationKind};

    use super::*;

    fn chain(count: usize) -> Graph {
        let mut graph = Graph::new();
        let mut previous = None;
        for i in 0..count {
            let id = graph
                .add_node(Node::new(format!("n{i}"), format!("node {i}"), NodeCategory::Service))
                .unwrap();
            if let Some(prev) = previous {
                graph.add_edge(prev, id, RelationKind::Flow).unwrap();
            }
            previous = Some(id);
        }
        graph
    }

    fn assert_disjoint(result: &LayoutResult) {
        let boxes = result.nodes();
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_engine_selection() {
        let config = LayoutConfig::default().with_layered_threshold(5);
        let cancel = CancellationToken::new();

        let small = layout(&chain(5), &config, &cancel).unwrap();
        assert_eq!(small.engine(), Engine::Layered);

        let large = layout(&chain(6), &config.with_force_iterations(30), &cancel).unwrap();
        assert_eq!(large.engine(), Engine::Force);
        assert_disjoint(&large);
    }

    #[test]
    fn test_canvas_contains_everything() {
        let graph = chain(3);
        let result = layout(&graph, &LayoutConfig::default(), &CancellationToken::new()).unwrap();

        let canvas = result.canvas();
        assert_eq!(canvas.min_point(), Point::default());
        for b in result.nodes() {
            assert_eq!(canvas.merge(b), canvas);
        }
        for (id, _) in graph.edges() {
            let route = result.route(id);
            assert!(route.len() >= 2);
            assert!(route.iter().all(|p| p.x() >= 0.0 && p.y() >= 0.0));
        }
    }

    #[test]
    fn test_group_bounds_contain_members() {
        let mut graph = Graph::new();
        let outer = graph.add_group("outer", None).unwrap();
        let inner = graph.add_group("inner", Some(outer)).unwrap();
        let empty = graph.add_group("empty", None).unwrap();
        let a = graph
            .add_node(Node::new("a", "a", NodeCategory::Service).with_group(Some(inner)))
            .unwrap();
        let b = graph
            .add_node(Node::new("b", "b", NodeCategory::Service).with_group(Some(outer)))
            .unwrap();
        graph.add_edge(a, b, RelationKind::Flow).unwrap();

        let result = layout(&graph, &LayoutConfig::default(), &CancellationToken::new()).unwrap();
        let outer_bounds = result.group_bounds(outer).unwrap();
        let inner_bounds = result.group_bounds(inner).unwrap();

        assert_eq!(inner_bounds.merge(&result.node_bounds(a)), inner_bounds);
        assert_eq!(outer_bounds.merge(&inner_bounds), outer_bounds);
        assert_eq!(outer_bounds.merge(&result.node_bounds(b)), outer_bounds);
        assert_eq!(result.group_bounds(empty), None);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = layout(&chain(3), &LayoutConfig::default(), &cancel);
        assert!(matches!(result, Err(LayoutError::Cancelled)));
    }
}
