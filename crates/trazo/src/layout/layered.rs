//! Layered layout engine for small graphs.
//!
//! The engine runs in a top-to-bottom frame and transposes its result for
//! left-to-right diagrams:
//!
//! 1. Back edges found by a depth-first search (first-appearance order) are
//!    reversed, leaving a DAG.
//! 2. Each node's layer is the length of the longest path reaching it.
//! 3. Within a layer nodes keep first-appearance order, except that members
//!    of a group are pulled together. An optional barycenter sweep then
//!    reorders each layer by the mean slot of its predecessors.
//! 4. Layers stack along the main axis and each one is centred on the cross
//!    axis.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{
    Direction::Incoming,
    algo::toposort,
    graph::{DiGraph, NodeIndex},
    visit::{DfsEvent, EdgeRef, depth_first_search},
};

use trazo_core::{
    geometry::{Point, Size},
    graph::{Direction, Graph, GroupId, NodeId},
};

use super::LayoutError;
use crate::CancellationToken;

/// Layered placement engine.
pub struct Engine {
    node_spacing: f32,
    layer_spacing: f32,
    group_padding: f32,
    group_header: f32,
    reduce_crossings: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            node_spacing: 40.0,
            layer_spacing: 60.0,
            group_padding: 16.0,
            group_header: 16.0,
            reduce_crossings: false,
        }
    }

    /// Set the minimum gap between nodes of the same layer
    pub fn set_node_spacing(&mut self, spacing: f32) -> &mut Self {
        self.node_spacing = spacing;
        self
    }

    /// Set the gap between consecutive layers
    pub fn set_layer_spacing(&mut self, spacing: f32) -> &mut Self {
        self.layer_spacing = spacing;
        self
    }

    /// Set the padding that group borders add around their members
    pub fn set_group_padding(&mut self, padding: f32) -> &mut Self {
        self.group_padding = padding;
        self
    }

    /// Set the height of the label band at the top of a group
    pub fn set_group_header(&mut self, height: f32) -> &mut Self {
        self.group_header = height;
        self
    }

    pub fn set_reduce_crossings(&mut self, enabled: bool) -> &mut Self {
        self.reduce_crossings = enabled;
        self
    }

    /// Computes node centers, indexed like `graph`'s nodes.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Cancelled`] if `cancel` fires between phases.
    pub fn calculate(
        &self,
        graph: &Graph,
        sizes: &[Size],
        cancel: &CancellationToken,
    ) -> Result<Vec<Point>, LayoutError> {
        let transposed = graph.direction() == Direction::LeftToRight;
        let frame_sizes: Vec<Size> = if transposed {
            sizes.iter().map(|s| s.transpose()).collect()
        } else {
            sizes.to_vec()
        };

        let dag = acyclic_graph(graph);
        let layer_of = assign_layers(&dag)?;
        if cancel.is_cancelled() {
            return Err(LayoutError::Cancelled);
        }

        let chains: Vec<Vec<GroupId>> = graph
            .nodes()
            .map(|(id, _)| group_chain(graph, id))
            .collect();
        let layers = self.order_layers(graph, &dag, &layer_of, &chains);
        debug!(layers = layers.len(), transposed = transposed; "Assigned layers");
        if cancel.is_cancelled() {
            return Err(LayoutError::Cancelled);
        }

        let has_groups = graph.group_count() > 0;
        let centers = self.position(&layers, &frame_sizes, &chains, has_groups, transposed);

        Ok(if transposed {
            centers.into_iter().map(Point::transpose).collect()
        } else {
            centers
        })
    }

    fn order_layers(
        &self,
        graph: &Graph,
        dag: &DiGraph<NodeId, ()>,
        layer_of: &[usize],
        chains: &[Vec<GroupId>],
    ) -> Vec<Vec<NodeId>> {
        let count = layer_of.iter().max().map_or(0, |deepest| deepest + 1);
        let mut layers = vec![Vec::new(); count];
        for (id, _) in graph.nodes() {
            layers[layer_of[id.index()]].push(id);
        }

        for layer in &mut layers {
            *layer = contiguous_groups(layer, chains, 0);
        }

        if self.reduce_crossings {
            barycenter_sweep(&mut layers, dag, chains);
        }
        layers
    }

    fn position(
        &self,
        layers: &[Vec<NodeId>],
        sizes: &[Size],
        chains: &[Vec<GroupId>],
        has_groups: bool,
        transposed: bool,
    ) -> Vec<Point> {
        let mut centers = vec![Point::default(); sizes.len()];
        let layer_gap = if has_groups {
            self.layer_spacing + 2.0 * self.group_padding + self.group_header
        } else {
            self.layer_spacing
        };

        let mut top = 0.0;
        for layer in layers {
            let extent = layer
                .iter()
                .map(|id| sizes[id.index()].height())
                .fold(0.0, f32::max);

            let gaps: Vec<f32> = layer
                .windows(2)
                .map(|pair| self.gap_between(&chains[pair[0].index()], &chains[pair[1].index()], transposed))
                .collect();
            let width: f32 = layer.iter().map(|id| sizes[id.index()].width()).sum::<f32>()
                + gaps.iter().sum::<f32>();

            let mut x = -width / 2.0;
            for (slot, id) in layer.iter().enumerate() {
                let size = sizes[id.index()];
                centers[id.index()] = Point::new(x + size.width() / 2.0, top + extent / 2.0);
                x += size.width() + gaps.get(slot).copied().unwrap_or(0.0);
                trace!(node:% = id, x = centers[id.index()].x(), y = centers[id.index()].y(); "Positioned node");
            }

            top += extent + layer_gap;
        }
        centers
    }

    /// Gap between two neighbours, widened for every group border between them.
    fn gap_between(&self, left: &[GroupId], right: &[GroupId], transposed: bool) -> f32 {
        let common = left.iter().zip(right).take_while(|(a, b)| a == b).count();
        let exited = left.len() - common;
        let entered = right.len() - common;
        let header = if transposed {
            entered as f32 * self.group_header
        } else {
            0.0
        };
        self.node_spacing + (exited + entered) as f32 * self.group_padding + header
    }
}

/// Copies the graph into petgraph with DFS back edges reversed.
///
/// Node `i` of the result is node `i` of `graph`. Self-loops are dropped.
fn acyclic_graph(graph: &Graph) -> DiGraph<NodeId, ()> {
    let mut dag = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    for (id, _) in graph.nodes() {
        dag.add_node(id);
    }
    let endpoints: Vec<(NodeIndex, NodeIndex)> = graph
        .edges()
        .map(|(_, edge)| edge)
        .filter(|edge| !edge.is_self_loop())
        .map(|edge| {
            (
                NodeIndex::new(edge.source().index()),
                NodeIndex::new(edge.target().index()),
            )
        })
        .collect();
    for &(source, target) in &endpoints {
        dag.add_edge(source, target, ());
    }

    let mut back_edges = HashSet::new();
    depth_first_search(&dag, dag.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back_edges.insert((u, v));
        }
    });
    if back_edges.is_empty() {
        return dag;
    }
    debug!(reversed = back_edges.len(); "Reversing back edges");

    let edges: Vec<(NodeIndex, NodeIndex)> = dag
        .edge_references()
        .map(|e| (e.source(), e.target()))
        .collect();
    dag.clear_edges();
    for (source, target) in edges {
        if back_edges.contains(&(source, target)) {
            dag.add_edge(target, source, ());
        } else {
            dag.add_edge(source, target, ());
        }
    }
    dag
}

/// Longest-path layer of every node.
fn assign_layers(dag: &DiGraph<NodeId, ()>) -> Result<Vec<usize>, LayoutError> {
    let order = toposort(dag, None).map_err(|cycle| LayoutError::Cycle(dag[cycle.node_id()]))?;
    let mut layer = vec![0usize; dag.node_count()];
    for index in order {
        let next_layer = layer[index.index()] + 1;
        for successor in dag.neighbors(index) {
            layer[successor.index()] = layer[successor.index()].max(next_layer);
        }
    }
    Ok(layer)
}

/// Enclosing groups of a node, outermost first.
fn group_chain(graph: &Graph, node: NodeId) -> Vec<GroupId> {
    let mut chain = Vec::new();
    let mut current = graph.node(node).group();
    while let Some(group) = current {
        chain.push(group);
        current = graph.group(group).parent();
    }
    chain.reverse();
    chain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Node(NodeId),
    Group(GroupId),
}

/// Reorders `members` so that every group's members are adjacent.
///
/// A group takes the place of its first member; everything else keeps the
/// order of `members`. Nested groups are handled recursively.
fn contiguous_groups(members: &[NodeId], chains: &[Vec<GroupId>], depth: usize) -> Vec<NodeId> {
    let mut slots: IndexMap<Slot, Vec<NodeId>> = IndexMap::new();
    for &node in members {
        let slot = chains[node.index()]
            .get(depth)
            .map_or(Slot::Node(node), |&group| Slot::Group(group));
        slots.entry(slot).or_default().push(node);
    }

    slots
        .into_iter()
        .flat_map(|(slot, nodes)| match slot {
            Slot::Node(_) => nodes,
            Slot::Group(_) => contiguous_groups(&nodes, chains, depth + 1),
        })
        .collect()
}

/// One downward pass ordering each layer by predecessor barycenters.
fn barycenter_sweep(layers: &mut [Vec<NodeId>], dag: &DiGraph<NodeId, ()>, chains: &[Vec<GroupId>]) {
    for i in 1..layers.len() {
        let slot_above: HashMap<NodeId, usize> = layers[i - 1]
            .iter()
            .enumerate()
            .map(|(slot, &node)| (node, slot))
            .collect();

        let mut keyed: Vec<(f32, usize, NodeId)> = layers[i]
            .iter()
            .enumerate()
            .map(|(slot, &node)| {
                let above: Vec<usize> = dag
                    .neighbors_directed(NodeIndex::new(node.index()), Incoming)
                    .filter_map(|p| slot_above.get(&dag[p]).copied())
                    .collect();
                let barycenter = if above.is_empty() {
                    slot as f32
                } else {
                    above.iter().sum::<usize>() as f32 / above.len() as f32
                };
                (barycenter, slot, node)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let reordered: Vec<NodeId> = keyed.into_iter().map(|(_, _, node)| node).collect();
        layers[i] = contiguous_groups(&reordered, chains, 0);
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use trazo_core::graph::{Node, NodeCategory, RelationKind};

    use super::*;

    fn graph_with(keys: &[&str], edges: &[(usize, usize)]) -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::new();
        let ids: Vec<NodeId> = keys
            .iter()
            .map(|k| graph.add_node(Node::new(*k, *k, NodeCategory::Service)).unwrap())
            .collect();
        for &(s, t) in edges {
            graph.add_edge(ids[s], ids[t], RelationKind::Flow).unwrap();
        }
        (graph, ids)
    }

    fn run(engine: &Engine, graph: &Graph) -> Vec<Point> {
        let sizes = vec![Size::new(100.0, 40.0); graph.node_count()];
        engine
            .calculate(graph, &sizes, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_chain_forms_vertical_column() {
        let (graph, ids) = graph_with(&["a", "b", "c"], &[(0, 1), (1, 2)]);
        let centers = run(&Engine::new(), &graph);

        let [a, b, c] = [ids[0], ids[1], ids[2]].map(|id| centers[id.index()]);
        assert!(approx_eq!(f32, a.x(), b.x()));
        assert!(approx_eq!(f32, b.x(), c.x()));
        assert!(a.y() < b.y() && b.y() < c.y());
    }

    #[test]
    fn test_cycle_is_broken_at_back_edge() {
        let (graph, _) = graph_with(&["a", "b", "c"], &[(0, 1), (1, 2), (2, 0)]);
        let dag = acyclic_graph(&graph);
        assert_eq!(assign_layers(&dag).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_longest_path_layering() {
        // a -> b -> c and a -> c: c sits below b, not beside it.
        let (graph, _) = graph_with(&["a", "b", "c"], &[(0, 1), (1, 2), (0, 2)]);
        let dag = acyclic_graph(&graph);
        assert_eq!(assign_layers(&dag).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let (graph, _) = graph_with(&["a"], &[(0, 0)]);
        let dag = acyclic_graph(&graph);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn test_group_members_are_contiguous() {
        let mut graph = Graph::new();
        let group = graph.add_group("cluster", None).unwrap();
        let a = graph
            .add_node(Node::new("a", "a", NodeCategory::Service).with_group(Some(group)))
            .unwrap();
        let b = graph.add_node(Node::new("b", "b", NodeCategory::Service)).unwrap();
        let c = graph
            .add_node(Node::new("c", "c", NodeCategory::Service).with_group(Some(group)))
            .unwrap();

        let chains: Vec<Vec<GroupId>> = graph.nodes().map(|(id, _)| group_chain(&graph, id)).collect();
        assert_eq!(contiguous_groups(&[a, b, c], &chains, 0), vec![a, c, b]);
    }

    #[test]
    fn test_layers_are_centred() {
        let (graph, ids) = graph_with(&["root", "l", "r"], &[(0, 1), (0, 2)]);
        let centers = run(&Engine::new(), &graph);
        let root = centers[ids[0].index()];
        let left = centers[ids[1].index()];
        let right = centers[ids[2].index()];

        assert!(approx_eq!(f32, root.x(), 0.0));
        assert!(approx_eq!(f32, left.x() + right.x(), 0.0));
        assert!(right.x() - left.x() >= 100.0 + 40.0);
    }

    #[test]
    fn test_left_to_right_transposes() {
        let (mut graph, ids) = graph_with(&["a", "b"], &[(0, 1)]);
        graph.set_direction(Direction::LeftToRight);
        let centers = run(&Engine::new(), &graph);
        let a = centers[ids[0].index()];
        let b = centers[ids[1].index()];
        assert!(approx_eq!(f32, a.y(), b.y()));
        assert!(a.x() < b.x());
    }

    #[test]
    fn test_barycenter_uncrosses_edges() {
        // a -> d, b -> c: first-appearance order crosses, barycenters do not.
        let (graph, ids) = graph_with(&["a", "b", "c", "d"], &[(0, 3), (1, 2)]);

        let plain = run(&Engine::new(), &graph);
        assert!(plain[ids[2].index()].x() < plain[ids[3].index()].x());

        let mut engine = Engine::new();
        engine.set_reduce_crossings(true);
        let reduced = run(&engine, &graph);
        assert!(reduced[ids[3].index()].x() < reduced[ids[2].index()].x());
    }

    #[test]
    fn test_cancelled() {
        let (graph, _) = graph_with(&["a", "b"], &[(0, 1)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let sizes = vec![Size::new(10.0, 10.0); 2];
        assert!(matches!(
            Engine::new().calculate(&graph, &sizes, &cancel),
            Err(LayoutError::Cancelled)
        ));
    }
}
