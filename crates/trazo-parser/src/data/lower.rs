//! Lowering of JSON documents into a containment tree.
//!
//! Objects and arrays become `Container` nodes, primitives become `Value`
//! nodes, and every member or element hangs off its parent by a directed
//! `Containment` edge. Node keys are JSON paths such as `$.servers[0].port`.

use indexmap::IndexMap;
use log::debug;

use trazo_core::graph::{Graph, GraphError, Node, NodeCategory, NodeId, RelationKind};

use super::ast::{Document, Member, Value};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
};

/// `true` if `key` can follow a `.` in a path.
fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Path of member `key` under `parent`.
fn member_path(parent: &str, key: &str) -> String {
    if is_plain_key(key) {
        format!("{parent}.{key}")
    } else {
        format!("{parent}[{key:?}]")
    }
}

/// How a child is named relative to its parent.
enum Slot<'a> {
    Root,
    Member(&'a str),
    Element(usize),
}

impl Slot<'_> {
    fn label(&self, value: &Value) -> String {
        let container = matches!(value, Value::Object(_) | Value::Array(_));
        match (self, container) {
            (Slot::Root, true) => "$".to_string(),
            (Slot::Member(key), true) => (*key).to_string(),
            (Slot::Element(index), true) => format!("[{index}]"),
            (Slot::Member(key), false) => format!("{key}: {value}"),
            (Slot::Root | Slot::Element(_), false) => value.to_string(),
        }
    }
}

struct Lowerer {
    graph: Graph,
    diagnostics: DiagnosticCollector,
}

impl Lowerer {
    fn value(&mut self, path: String, slot: Slot<'_>, value: Spanned<Value>, parent: Option<NodeId>) {
        let span = value.span();
        let value = value.into_inner();
        let category = match value {
            Value::Object(_) | Value::Array(_) => NodeCategory::Container,
            _ => NodeCategory::Value,
        };
        let mut node = Node::new(path.clone(), slot.label(&value), category)
            .with_attribute("type", value.type_name());
        match &value {
            Value::Object(members) => node = node.with_attribute("size", members.len().to_string()),
            Value::Array(elements) => node = node.with_attribute("size", elements.len().to_string()),
            _ => {}
        }

        let id = match self.graph.add_node(node) {
            Ok(id) => id,
            Err(err) => {
                self.graph_error(err, span);
                return;
            }
        };
        if let Some(parent) = parent {
            if let Err(err) = self.graph.add_edge(parent, id, RelationKind::Containment) {
                self.graph_error(err, span);
            }
        }

        match value {
            Value::Object(members) => self.members(&path, members, id),
            Value::Array(elements) => {
                for (index, element) in elements.into_iter().enumerate() {
                    self.value(format!("{path}[{index}]"), Slot::Element(index), element, Some(id));
                }
            }
            _ => {}
        }
    }

    fn members(&mut self, path: &str, members: Vec<Member>, id: NodeId) {
        let mut seen: IndexMap<String, Span> = IndexMap::new();
        for Member { key, value } in members {
            if let Some(first) = seen.get(key.inner()) {
                self.diagnostics.emit(
                    Diagnostic::error(format!("duplicate key `{}` in object", *key))
                        .with_code(ErrorCode::E201)
                        .with_label(key.span(), "duplicate key")
                        .with_related_label(*first, "first used here"),
                );
                continue;
            }
            seen.insert(key.inner().clone(), key.span());
            self.value(member_path(path, key.inner()), Slot::Member(key.inner()), value, Some(id));
        }
    }

    fn graph_error(&mut self, err: GraphError, span: Span) {
        let code = match err {
            GraphError::DuplicateNode(_) => ErrorCode::E201,
            GraphError::DanglingEdge(_) | GraphError::UnknownGroup(_) => ErrorCode::E200,
        };
        self.diagnostics.emit(
            Diagnostic::error(err.to_string())
                .with_code(code)
                .with_label(span, code.description()),
        );
    }
}

/// Lowers a JSON [`Document`] into a containment [`Graph`].
///
/// # Errors
///
/// Returns every duplicate object key (E201).
pub fn lower(document: Document) -> Result<Graph, ParseError> {
    let mut lowerer = Lowerer {
        graph: Graph::new(),
        diagnostics: DiagnosticCollector::new(),
    };
    lowerer.value("$".to_string(), Slot::Root, document.root, None);
    let graph = lowerer.diagnostics.finish(lowerer.graph)?;
    debug!(nodes = graph.node_count(), edges = graph.edge_count(); "Lowered data document");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parser::parse;

    fn lower_source(source: &str) -> Result<Graph, ParseError> {
        lower(parse(source).expect("source should parse"))
    }

    fn keys(graph: &Graph) -> Vec<String> {
        graph.nodes().map(|(_, n)| n.key().to_string()).collect()
    }

    #[test]
    fn test_paths_and_categories() {
        let graph = lower_source(r#"{"servers": [{"port": 80}], "debug mode": false}"#).unwrap();
        assert_eq!(
            keys(&graph),
            [
                "$",
                "$.servers",
                "$.servers[0]",
                "$.servers[0].port",
                "$[\"debug mode\"]",
            ]
        );
        let root = graph.node(graph.lookup("$").unwrap());
        assert_eq!(root.category(), NodeCategory::Container);
        assert_eq!(root.attribute("type"), Some("object"));
        assert_eq!(root.attribute("size"), Some("2"));
    }

    #[test]
    fn test_labels() {
        let graph = lower_source(r#"{"name": "trazo", "tags": ["a", 2, null]}"#).unwrap();
        let labels: Vec<_> = graph.nodes().map(|(_, n)| n.label().to_string()).collect();
        assert_eq!(labels, ["$", "name: \"trazo\"", "tags", "\"a\"", "2", "null"]);
    }

    #[test]
    fn test_containment_edges() {
        let graph = lower_source("[[1], 2]").unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        for (_, edge) in graph.edges() {
            assert_eq!(edge.relation(), RelationKind::Containment);
            assert!(edge.is_directed());
            assert!(edge.source().index() < edge.target().index());
        }
    }

    #[test]
    fn test_primitive_root_is_a_single_value() {
        let graph = lower_source("\"hello\"").unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(graph.lookup("$").unwrap()).label(), "\"hello\"");
    }

    #[test]
    fn test_duplicate_keys_collected() {
        let err = lower_source(r#"{"a": 1, "a": 2, "b": {"c": 1, "c": 2}}"#).unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert!(
            err.diagnostics()
                .iter()
                .all(|d| d.code() == Some(ErrorCode::E201))
        );
    }
}
