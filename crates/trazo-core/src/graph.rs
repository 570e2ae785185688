//! The unified graph every notation lowers into.
//!
//! Nodes, edges and groups live in arenas and are addressed by dense integer
//! ids ([`NodeId`], [`EdgeId`], [`GroupId`]). Identity of a node is its
//! string key, unique within a graph. Insertion order is preserved
//! everywhere, so two graphs built from the same input compare equal with
//! `==` and lay out identically.
//!
//! The arena enforces the model invariants at insertion time:
//! - a node key may only be used once ([`GraphError::DuplicateNode`])
//! - both endpoints of an edge must already exist ([`GraphError::DanglingEdge`])
//!
//! # Example
//!
//! ```
//! # use trazo_core::graph::{Graph, Node, NodeCategory, RelationKind};
//! let mut graph = Graph::new();
//! let web = graph.add_node(Node::new("web", "Web", NodeCategory::Service)).unwrap();
//! let db = graph.add_node(Node::new("db", "Database", NodeCategory::Service)).unwrap();
//! graph.add_edge(web, db, RelationKind::Flow).unwrap();
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! assert_eq!(graph.lookup("db"), Some(db));
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

/// Index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Index of an edge in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a group in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u32);

impl GroupId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node stands for. Drives styling in the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// An infrastructure resource.
    Service,
    /// An ER table.
    Table,
    /// A structured-data object or array.
    Container,
    /// A structured-data primitive.
    Value,
}

impl NodeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeCategory::Service => "service",
            NodeCategory::Table => "table",
            NodeCategory::Container => "container",
            NodeCategory::Value => "value",
        }
    }
}

/// The kind of relation an edge expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Data or request flow between resources.
    Flow,
    /// Foreign-key reference between tables.
    ForeignKey,
    /// Parent/child nesting in structured data.
    Containment,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Flow => "flow",
            RelationKind::ForeignKey => "foreign-key",
            RelationKind::Containment => "containment",
        }
    }
}

/// Main flow direction of a diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Layers stack downward.
    #[default]
    TopToBottom,
    /// Layers stack rightward.
    LeftToRight,
}

impl Direction {
    /// Parses a direction code, ignoring ASCII case. Only `TB` and `LR` are laid out.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "TB" => Some(Direction::TopToBottom),
            "LR" => Some(Direction::LeftToRight),
            _ => None,
        }
    }
}

/// A compartment row displayed inside a node, such as a table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    detail: Option<String>,
    primary_key: bool,
    foreign_key: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
            primary_key: false,
            foreign_key: false,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: bool) -> Self {
        self.foreign_key = foreign_key;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key
    }

    /// The row as rendered: `name: detail`, with key markers.
    pub fn display_text(&self) -> String {
        let marker = match (self.primary_key, self.foreign_key) {
            (true, true) => "PK FK ",
            (true, false) => "PK ",
            (false, true) => "FK ",
            (false, false) => "",
        };
        match &self.detail {
            Some(detail) => format!("{marker}{}: {detail}", self.name),
            None => format!("{marker}{}", self.name),
        }
    }
}

/// A unified diagram element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    key: String,
    label: String,
    category: NodeCategory,
    attributes: IndexMap<String, String>,
    fields: Vec<Field>,
    group: Option<GroupId>,
}

impl Node {
    pub fn new(key: impl Into<String>, label: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            category,
            attributes: IndexMap::new(),
            fields: Vec::new(),
            group: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_group(mut self, group: Option<GroupId>) -> Self {
        self.group = group;
        self
    }

    /// Unique identity within the graph.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }
}

/// A relation between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    relation: RelationKind,
    directed: bool,
    label: Option<String>,
    attributes: IndexMap<String, String>,
}

impl Edge {
    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn relation(&self) -> RelationKind {
        self.relation
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Builder handle returned by [`Graph::add_edge`] to decorate a freshly
/// inserted edge.
pub struct EdgeMut<'g> {
    edge: &'g mut Edge,
    id: EdgeId,
}

impl EdgeMut<'_> {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.edge.label = Some(label.into());
        self
    }

    pub fn set_directed(&mut self, directed: bool) -> &mut Self {
        self.edge.directed = directed;
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.edge.attributes.insert(name.into(), value.into());
        self
    }
}

/// A named cluster of nodes. Groups may nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    label: String,
    parent: Option<GroupId>,
}

impl Group {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }
}

/// Errors raised when an insertion would break a graph invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node `{0}` is already defined")]
    DuplicateNode(String),

    #[error("edge endpoint {0} does not exist")]
    DanglingEdge(NodeId),

    #[error("group {0:?} does not exist")]
    UnknownGroup(GroupId),
}

/// The unified diagram graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    title: Option<String>,
    direction: Direction,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    groups: Vec<Group>,
    index: IndexMap<String, NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Inserts a node, rejecting a key that is already present.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if the key is taken, or
    /// [`GraphError::UnknownGroup`] if the node refers to a missing group.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.index.contains_key(node.key()) {
            return Err(GraphError::DuplicateNode(node.key.clone()));
        }
        if let Some(group) = node.group.filter(|g| g.index() >= self.groups.len()) {
            return Err(GraphError::UnknownGroup(group));
        }

        let id = NodeId(self.nodes.len() as u32);
        trace!(key = node.key(), id:% = id; "Adding node");
        self.index.insert(node.key.clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Inserts a directed, unlabelled edge between two existing nodes and
    /// returns a handle for further decoration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingEdge`] if either endpoint is missing.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        relation: RelationKind,
    ) -> Result<EdgeMut<'_>, GraphError> {
        for endpoint in [source, target] {
            if endpoint.index() >= self.nodes.len() {
                return Err(GraphError::DanglingEdge(endpoint));
            }
        }

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            source,
            target,
            relation,
            directed: true,
            label: None,
            attributes: IndexMap::new(),
        });
        let edge = &mut self.edges[id.index()];
        Ok(EdgeMut { edge, id })
    }

    /// Creates a group nested in `parent` (or at top level).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownGroup`] if `parent` does not exist.
    pub fn add_group(
        &mut self,
        label: impl Into<String>,
        parent: Option<GroupId>,
    ) -> Result<GroupId, GraphError> {
        if let Some(parent) = parent.filter(|g| g.index() >= self.groups.len()) {
            return Err(GraphError::UnknownGroup(parent));
        }
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(Group {
            label: label.into(),
            parent,
        });
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    /// Looks up a node by its key.
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, edge)| (EdgeId(i as u32), edge))
    }

    /// Groups in creation order.
    pub fn groups(&self) -> impl ExactSizeIterator<Item = (GroupId, &Group)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, group)| (GroupId(i as u32), group))
    }

    /// Returns `true` if `node` belongs to `group` directly or through a nested group.
    pub fn is_member(&self, node: NodeId, group: GroupId) -> bool {
        let mut current = self.node(node).group;
        while let Some(g) = current {
            if g == group {
                return true;
            }
            current = self.group(g).parent;
        }
        false
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(key: &str) -> Node {
        Node::new(key, key.to_uppercase(), NodeCategory::Service)
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = Graph::new();
        graph.add_node(service("a")).unwrap();
        assert_eq!(
            graph.add_node(service("a")),
            Err(GraphError::DuplicateNode("a".to_string()))
        );
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut graph = Graph::new();
        let a = graph.add_node(service("a")).unwrap();
        let missing = NodeId(7);
        assert!(matches!(
            graph.add_edge(a, missing, RelationKind::Flow),
            Err(GraphError::DanglingEdge(id)) if id == missing
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_edge_decoration() {
        let mut graph = Graph::new();
        let a = graph.add_node(service("a")).unwrap();
        let b = graph.add_node(service("b")).unwrap();
        graph
            .add_edge(a, b, RelationKind::ForeignKey)
            .unwrap()
            .set_label("one-to-many")
            .set_directed(false)
            .set_attribute("cardinality", "||--o{");

        let (_, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.label(), Some("one-to-many"));
        assert!(!edge.is_directed());
        assert_eq!(edge.attribute("cardinality"), Some("||--o{"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut graph = Graph::new();
        for key in ["c", "a", "b"] {
            graph.add_node(service(key)).unwrap();
        }
        let keys: Vec<_> = graph.nodes().map(|(_, n)| n.key().to_string()).collect();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn test_group_membership_is_transitive() {
        let mut graph = Graph::new();
        let outer = graph.add_group("outer", None).unwrap();
        let inner = graph.add_group("inner", Some(outer)).unwrap();
        let a = graph
            .add_node(service("a").with_group(Some(inner)))
            .unwrap();
        let b = graph.add_node(service("b")).unwrap();

        assert!(graph.is_member(a, inner));
        assert!(graph.is_member(a, outer));
        assert!(!graph.is_member(b, outer));
    }

    #[test]
    fn test_unknown_group_rejected() {
        let mut graph = Graph::new();
        assert_eq!(
            graph.add_node(service("a").with_group(Some(GroupId(3)))),
            Err(GraphError::UnknownGroup(GroupId(3)))
        );
    }

    #[test]
    fn test_structural_equality() {
        let build = || {
            let mut graph = Graph::new();
            let a = graph.add_node(service("a")).unwrap();
            let b = graph.add_node(service("b")).unwrap();
            graph.add_edge(a, b, RelationKind::Flow).unwrap();
            graph
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_field_display_text() {
        let field = Field::new("user_id")
            .with_detail("int")
            .with_foreign_key(true);
        assert_eq!(field.display_text(), "FK user_id: int");
        assert_eq!(Field::new("id").with_primary_key(true).display_text(), "PK id");
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(Direction::from_code("lr"), Some(Direction::LeftToRight));
        assert_eq!(Direction::from_code("TB"), Some(Direction::TopToBottom));
        assert_eq!(Direction::from_code("diagonal"), None);
        assert_eq!(Direction::from_code("BT"), None);
        assert_eq!(Direction::from_code("rl"), None);
    }
}
