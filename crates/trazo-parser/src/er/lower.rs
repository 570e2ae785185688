//! Lowering of entity-relationship schemas into the unified graph.
//!
//! Tables become `Table` nodes with one field per column. Foreign-key
//! columns become directed `ForeignKey` edges from the referencing table to
//! the referenced one, labelled with the cardinality of the matching relation
//! line. Relation lines that no column accounts for are kept as undirected
//! edges.

use indexmap::IndexMap;
use log::{debug, trace};

use trazo_core::{
    color::Color,
    graph::{Field, Graph, GraphError, Node, NodeCategory, NodeId, RelationKind},
};

use super::ast::{
    Attribute, Cardinality, Column, Item, Relation, Schema, TableHeader, find_attribute,
};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
};

/// Label used when no relation line gives a foreign key its cardinality.
const DEFAULT_CARDINALITY: &str = "one-to-many";

/// Attributes whose values must be colours.
const COLOR_ATTRIBUTES: [&str; 2] = ["bgcolor", "color"];

/// Target of a `FK(table)` or `FK(table.column)` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    table: String,
    column: Option<String>,
}

/// Meaning of a column's `label` text, e.g. `"int, not null, FK(users)"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnLabel {
    data_type: Option<String>,
    nullable: Option<bool>,
    unique: bool,
    primary_key: bool,
    reference: Option<Reference>,
}

impl ColumnLabel {
    fn parse(text: &str) -> Self {
        let mut label = Self::default();
        for part in split_top_level(text) {
            if let Some(inner) = fk_target(part) {
                let (table, column) = match inner.split_once('.') {
                    Some((table, column)) => (table, Some(column.trim().to_lowercase())),
                    None => (inner, None),
                };
                label.reference = Some(Reference {
                    table: table.trim().to_lowercase(),
                    column,
                });
                continue;
            }
            let lower = part.to_lowercase();
            match lower.as_str() {
                "" => {}
                "null" | "nullable" => label.nullable = Some(true),
                "not null" => label.nullable = Some(false),
                "unique" => label.unique = true,
                "pk" | "primary key" => label.primary_key = true,
                "fk" => {}
                _ if label.data_type.is_none() => label.data_type = Some(part.to_string()),
                _ => {}
            }
        }
        label
    }

    /// `true` if the label marks the column as a foreign key.
    fn is_foreign_key(text: &str) -> bool {
        split_top_level(text)
            .into_iter()
            .any(|part| part.eq_ignore_ascii_case("fk") || fk_target(part).is_some())
    }
}

/// The text inside a `FK(...)` annotation; the prefix is matched ignoring ASCII case.
fn fk_target(part: &str) -> Option<&str> {
    let prefix = part.get(..3)?;
    if !prefix.eq_ignore_ascii_case("fk(") {
        return None;
    }
    part.get(3..)?.strip_suffix(')')
}

/// Splits on commas outside parentheses and trims each part.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

#[derive(Debug)]
struct ColumnDef {
    name: Spanned<String>,
    key: String,
    primary_key: bool,
    foreign_key: bool,
    reference: Option<Spanned<Reference>>,
    detail: Option<String>,
}

#[derive(Debug)]
struct TableDef {
    label: String,
    span: Span,
    attributes: Vec<(String, String)>,
    columns: Vec<ColumnDef>,
}

/// Table that following column lines attach to.
#[derive(Debug, Clone, Copy)]
enum Scope {
    None,
    Table(usize),
    /// Columns of a rejected duplicate table are dropped silently.
    Skipped,
}

/// A relation line whose tables both exist.
#[derive(Debug)]
struct ResolvedRelation {
    relation: Relation,
    left: String,
    right: String,
    attributes: Vec<(String, String)>,
    used: bool,
}

impl ResolvedRelation {
    fn involves(&self, table: &str) -> bool {
        self.left == table || self.right == table
    }

    fn connects(&self, a: &str, b: &str) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }

    fn other_side(&self, table: &str) -> &str {
        if self.left == table { &self.right } else { &self.left }
    }

    /// Cardinality name read from `parent` to `child`.
    fn name_from(&self, parent: &str) -> String {
        let r = &self.relation;
        if self.left == parent {
            Cardinality::relation_name(r.left_cardinality, r.right_cardinality)
        } else {
            Cardinality::relation_name(r.right_cardinality, r.left_cardinality)
        }
    }
}

struct Lowerer {
    graph: Graph,
    diagnostics: DiagnosticCollector,
    tables: IndexMap<String, TableDef>,
    relations: Vec<ResolvedRelation>,
    nodes: IndexMap<String, NodeId>,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            diagnostics: DiagnosticCollector::new(),
            tables: IndexMap::new(),
            relations: Vec::new(),
            nodes: IndexMap::new(),
        }
    }

    /// First pass: tables, their columns, and relation lines.
    fn collect(&mut self, items: Vec<Spanned<Item>>) -> Vec<Relation> {
        let mut scope = Scope::None;
        let mut relations = Vec::new();

        for item in items {
            let span = item.span();
            match item.into_inner() {
                Item::Table(header) => scope = self.table(header),
                Item::Column(column) => match scope {
                    Scope::Table(index) => self.column(index, column),
                    Scope::Skipped => {}
                    Scope::None => self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "column `{}` is not inside a table",
                            *column.name
                        ))
                        .with_code(ErrorCode::E205)
                        .with_label(span, "no table header above")
                        .with_help("declare a table first, e.g. `[users]`"),
                    ),
                },
                Item::Relation(relation) => relations.push(relation),
            }
        }
        relations
    }

    fn table(&mut self, header: TableHeader) -> Scope {
        let key = header.name.to_lowercase();
        if let Some(existing) = self.tables.get(&key) {
            self.diagnostics.emit(
                Diagnostic::error(format!("table `{}` is defined multiple times", *header.name))
                    .with_code(ErrorCode::E201)
                    .with_label(header.name.span(), "duplicate table")
                    .with_related_label(existing.span, "first defined here"),
            );
            return Scope::Skipped;
        }

        let label = find_attribute(&header.attributes, "label")
            .map_or_else(|| header.name.inner().clone(), |a| a.value.inner().clone());
        let attributes = self.validated_attributes(&header.attributes, &["label"]);
        let (index, _) = self.tables.insert_full(
            key,
            TableDef {
                label,
                span: header.name.span(),
                attributes,
                columns: Vec::new(),
            },
        );
        Scope::Table(index)
    }

    fn column(&mut self, table_index: usize, column: Column) {
        let Some((_, table)) = self.tables.get_index_mut(table_index) else {
            return;
        };
        let key = column.name.to_lowercase();
        if let Some(existing) = table.columns.iter().find(|c| c.key == key) {
            let first = existing.name.span();
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "column `{}` is defined multiple times in `{}`",
                    *column.name, table.label
                ))
                .with_code(ErrorCode::E201)
                .with_label(column.name.span(), "duplicate column")
                .with_related_label(first, "first defined here"),
            );
            return;
        }

        let label_attribute = find_attribute(&column.attributes, "label");
        let label = label_attribute
            .map(|a| ColumnLabel::parse(a.value.inner()))
            .unwrap_or_default();
        let reference = label
            .reference
            .clone()
            .zip(label_attribute)
            .map(|(reference, attribute)| Spanned::new(reference, attribute.value.span()));
        let foreign_key = column.foreign_key
            || label_attribute.is_some_and(|a| ColumnLabel::is_foreign_key(a.value.inner()));

        let data_type = column
            .data_type
            .map(Spanned::into_inner)
            .or(label.data_type);
        let mut detail: Vec<String> = data_type.into_iter().collect();
        if label.nullable == Some(false) {
            detail.push("not null".to_string());
        }
        if label.unique {
            detail.push("unique".to_string());
        }

        table.columns.push(ColumnDef {
            name: column.name,
            key,
            primary_key: column.primary_key || label.primary_key,
            foreign_key,
            reference,
            detail: (!detail.is_empty()).then(|| detail.join(" ")),
        });
    }

    /// Keeps attributes except `skip`, reporting colours that do not parse.
    fn validated_attributes(&mut self, attributes: &[Attribute], skip: &[&str]) -> Vec<(String, String)> {
        let mut kept = Vec::new();
        for attribute in attributes {
            let key = attribute.key.to_lowercase();
            if skip.contains(&key.as_str()) {
                continue;
            }
            if COLOR_ATTRIBUTES.contains(&key.as_str()) {
                if let Err(reason) = Color::new(attribute.value.inner()) {
                    self.diagnostics.emit(
                        Diagnostic::error(format!("invalid {key} `{}`: {reason}", *attribute.value))
                            .with_code(ErrorCode::E203)
                            .with_label(attribute.value.span(), "not a colour")
                            .with_help("use a CSS colour such as \"#d0e0d0\" or \"lightblue\""),
                    );
                    continue;
                }
            }
            kept.push((key, attribute.value.inner().clone()));
        }
        kept
    }

    /// Second pass: one node per table, in declaration order.
    fn add_tables(&mut self) {
        for (key, table) in &self.tables {
            let mut node = Node::new(key.clone(), table.label.clone(), NodeCategory::Table);
            for (name, value) in &table.attributes {
                node = node.with_attribute(name.clone(), value.clone());
            }
            for column in &table.columns {
                let mut field = Field::new(column.name.inner().clone())
                    .with_primary_key(column.primary_key)
                    .with_foreign_key(column.foreign_key);
                if let Some(detail) = &column.detail {
                    field = field.with_detail(detail.clone());
                }
                node = node.with_field(field);
            }

            match self.graph.add_node(node) {
                Ok(id) => {
                    self.nodes.insert(key.clone(), id);
                }
                Err(err) => {
                    let code = graph_error_code(&err);
                    self.diagnostics.emit(
                        Diagnostic::error(err.to_string())
                            .with_code(code)
                            .with_label(table.span, code.description()),
                    );
                }
            }
        }
    }

    /// Keeps relation lines whose tables exist, reporting the others.
    fn resolve_relations(&mut self, relations: Vec<Relation>) {
        for relation in relations {
            let left = relation.left.to_lowercase();
            let right = relation.right.to_lowercase();
            let mut known = true;
            for (key, name) in [(&left, &relation.left), (&right, &relation.right)] {
                if !self.tables.contains_key(key) {
                    known = false;
                    self.undefined_table(name.inner(), name.span());
                }
            }
            if known {
                let attributes = self.validated_attributes(&relation.attributes, &[]);
                self.relations.push(ResolvedRelation {
                    relation,
                    left,
                    right,
                    attributes,
                    used: false,
                });
            }
        }
    }

    fn undefined_table(&mut self, name: &str, span: Span) {
        self.diagnostics.emit(
            Diagnostic::error(format!("undefined table `{name}`"))
                .with_code(ErrorCode::E200)
                .with_label(span, "not defined")
                .with_help(format!("declare it with `[{name}]`")),
        );
    }

    /// Third pass: one edge per foreign-key column.
    fn foreign_keys(&mut self) {
        let mut edges = Vec::new();
        for (table_key, table) in &self.tables {
            for column in table.columns.iter().filter(|c| c.foreign_key) {
                edges.push((table_key.clone(), column.name.clone(), column.reference.clone()));
            }
        }

        for (table, column, reference) in edges {
            let Some(parent) = self.referenced_table(&table, &column, reference.as_ref()) else {
                continue;
            };
            if parent == table {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "foreign key `{}` of `{table}` refers to its own table",
                        *column
                    ))
                    .with_code(ErrorCode::E202)
                    .with_label(column.span(), "self-referential foreign key"),
                );
                continue;
            }

            let relation = self
                .relations
                .iter_mut()
                .filter(|r| r.connects(&table, &parent))
                .min_by_key(|r| r.used);
            let (label, cardinality) = match relation {
                Some(relation) => {
                    relation.used = true;
                    (
                        relation.name_from(&parent),
                        Some(relation.relation.operator.inner().clone()),
                    )
                }
                None => (DEFAULT_CARDINALITY.to_string(), None),
            };

            let (Some(&child_id), Some(&parent_id)) = (self.nodes.get(&table), self.nodes.get(&parent))
            else {
                continue;
            };
            trace!(table = table.as_str(), column = column.inner().as_str(), parent = parent.as_str(); "Resolved foreign key");
            let added = self
                .graph
                .add_edge(child_id, parent_id, RelationKind::ForeignKey)
                .map(|mut edge| {
                    edge.set_label(label).set_attribute("column", column.inner().clone());
                    if let Some(cardinality) = cardinality {
                        edge.set_attribute("cardinality", cardinality);
                    }
                });
            if let Err(err) = added {
                self.graph_error(err, column.span());
            }
        }
    }

    /// Finds the table a foreign-key column points at.
    fn referenced_table(
        &mut self,
        table: &str,
        column: &Spanned<String>,
        reference: Option<&Spanned<Reference>>,
    ) -> Option<String> {
        if let Some(reference) = reference {
            let Some(target) = self.tables.get(&reference.table) else {
                self.undefined_table(&reference.table, reference.span());
                return None;
            };
            if let Some(name) = &reference.column {
                if !target.columns.iter().any(|c| &c.key == name) {
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "table `{}` has no column `{name}`",
                            reference.table
                        ))
                        .with_code(ErrorCode::E200)
                        .with_label(reference.span(), "undefined column"),
                    );
                    return None;
                }
            }
            return Some(reference.table.clone());
        }

        let conventional = conventional_targets(&column.to_lowercase());
        let related: Vec<&str> = self
            .relations
            .iter()
            .filter(|r| r.involves(table))
            .map(|r| r.other_side(table))
            .collect();
        if let Some(found) = related
            .iter()
            .copied()
            .find(|t| conventional.iter().any(|c| c.as_str() == *t))
            .or_else(|| related.first().copied())
        {
            return Some(found.to_string());
        }

        if let Some(found) = conventional.into_iter().find(|c| self.tables.contains_key(c)) {
            return Some(found);
        }

        self.diagnostics.emit(
            Diagnostic::error(format!(
                "cannot tell which table foreign key `{}` refers to",
                **column
            ))
            .with_code(ErrorCode::E204)
            .with_label(column.span(), "unresolved foreign key")
            .with_help("add `{label: \"FK(table)\"}` or a relation line such as `users ||--o{ posts`"),
        );
        None
    }

    /// Last pass: relation lines that no column claimed.
    fn remaining_relations(&mut self) {
        let unused: Vec<_> = self
            .relations
            .iter()
            .filter(|r| !r.used)
            .map(|r| {
                (
                    r.left.clone(),
                    r.right.clone(),
                    r.name_from(&r.left),
                    r.relation.operator.clone(),
                    r.attributes.clone(),
                )
            })
            .collect();

        for (left, right, label, operator, attributes) in unused {
            let (Some(&source), Some(&target)) = (self.nodes.get(&left), self.nodes.get(&right))
            else {
                continue;
            };
            let added = self
                .graph
                .add_edge(source, target, RelationKind::ForeignKey)
                .map(|mut edge| {
                    edge.set_directed(false)
                        .set_label(label)
                        .set_attribute("cardinality", operator.inner().clone());
                    for (name, value) in &attributes {
                        edge.set_attribute(name.clone(), value.clone());
                    }
                });
            if let Err(err) = added {
                self.graph_error(err, operator.span());
            }
        }
    }

    fn graph_error(&mut self, err: GraphError, span: Span) {
        let code = graph_error_code(&err);
        self.diagnostics.emit(
            Diagnostic::error(err.to_string())
                .with_code(code)
                .with_label(span, code.description()),
        );
    }

    fn finish(self) -> Result<Graph, ParseError> {
        self.diagnostics.finish(self.graph)
    }
}

fn graph_error_code(err: &GraphError) -> ErrorCode {
    match err {
        GraphError::DuplicateNode(_) => ErrorCode::E201,
        GraphError::DanglingEdge(_) | GraphError::UnknownGroup(_) => ErrorCode::E200,
    }
}

/// Table names a `<name>_id` column conventionally refers to.
fn conventional_targets(column: &str) -> Vec<String> {
    let Some(base) = column.strip_suffix("_id").filter(|b| !b.is_empty()) else {
        return Vec::new();
    };
    let mut targets = vec![base.to_string(), format!("{base}s"), format!("{base}es")];
    if let Some(stem) = base.strip_suffix('y') {
        targets.push(format!("{stem}ies"));
    }
    targets
}

/// Lowers an entity-relationship [`Schema`] into a [`Graph`].
///
/// # Errors
///
/// Returns every semantic error found: undefined tables (E200), duplicate
/// tables or columns (E201), self-referential foreign keys (E202), invalid
/// colours (E203), unresolvable foreign keys (E204) and columns outside a
/// table (E205).
pub fn lower(schema: Schema) -> Result<Graph, ParseError> {
    let mut lowerer = Lowerer::new();
    let relations = lowerer.collect(schema.items);
    lowerer.add_tables();
    lowerer.resolve_relations(relations);
    lowerer.foreign_keys();
    lowerer.remaining_relations();
    let graph = lowerer.finish()?;
    debug!(
        tables = graph.node_count(),
        relations = graph.edge_count();
        "Lowered entity-relationship schema"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::er::parser::parse;

    fn lower_source(source: &str) -> Result<Graph, ParseError> {
        lower(parse(source).expect("source should parse"))
    }

    fn only_edge(graph: &Graph) -> &trazo_core::graph::Edge {
        assert_eq!(graph.edge_count(), 1);
        graph.edges().next().map(|(_, e)| e).unwrap()
    }

    fn codes(err: &ParseError) -> Vec<ErrorCode> {
        err.diagnostics().iter().filter_map(|d| d.code()).collect()
    }

    #[test]
    fn test_column_label_parsing() {
        let label = ColumnLabel::parse("decimal(10,2), NOT NULL, unique, FK(Orders.ID)");
        assert_eq!(label.data_type.as_deref(), Some("decimal(10,2)"));
        assert_eq!(label.nullable, Some(false));
        assert!(label.unique);
        assert_eq!(
            label.reference,
            Some(Reference {
                table: "orders".to_string(),
                column: Some("id".to_string()),
            })
        );
    }

    #[test]
    fn test_non_ascii_label_text() {
        // U+212A lowercases to an ASCII `k` but is three bytes long.
        let label = ColumnLabel::parse("int, F\u{212A}(users)");
        assert_eq!(label.data_type.as_deref(), Some("int"));
        assert_eq!(label.reference, None);
        assert!(!ColumnLabel::is_foreign_key("F\u{212A}(users)"));

        let label = ColumnLabel::parse("texto, fk(usuários)");
        assert_eq!(label.data_type.as_deref(), Some("texto"));
        assert_eq!(label.reference.map(|r| r.table), Some("usuários".to_string()));

        let graph = lower_source("[users]\n*id\n\n[posts]\n*id\nowner {label: \"int, F\u{212A}(users)\"}\n")
            .unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_conventional_targets() {
        assert_eq!(conventional_targets("user_id"), ["user", "users", "useres"]);
        assert!(conventional_targets("category_id").contains(&"categories".to_string()));
        assert!(conventional_targets("name").is_empty());
        assert!(conventional_targets("_id").is_empty());
    }

    #[test]
    fn test_tables_and_fields() {
        let graph = lower_source(
            "[Users] {bgcolor: \"#d0e0d0\"}\n*id: int\nemail {label: \"varchar, not null, unique\"}\n",
        )
        .unwrap();
        let users = graph.node(graph.lookup("users").unwrap());
        assert_eq!(users.label(), "Users");
        assert_eq!(users.category(), NodeCategory::Table);
        assert_eq!(users.attribute("bgcolor"), Some("#d0e0d0"));
        let fields: Vec<_> = users.fields().iter().map(Field::display_text).collect();
        assert_eq!(fields, ["PK id: int", "email: varchar not null unique"]);
    }

    #[test]
    fn test_foreign_key_with_relation_line() {
        let graph = lower_source(
            "[users]\n*id\n[posts]\n*id\n+user_id\nusers ||--o{ posts\n",
        )
        .unwrap();
        assert_eq!(graph.node_count(), 2);
        let edge = only_edge(&graph);
        assert_eq!(graph.node(edge.source()).key(), "posts");
        assert_eq!(graph.node(edge.target()).key(), "users");
        assert!(edge.is_directed());
        assert_eq!(edge.relation(), RelationKind::ForeignKey);
        assert_eq!(edge.label(), Some("one-to-many"));
        assert_eq!(edge.attribute("cardinality"), Some("||--o{"));
    }

    #[test]
    fn test_relation_written_from_child_side() {
        let graph = lower_source(
            "[users]\n*id\n[posts]\n+author {label: \"FK(users)\"}\nposts }o--|| users\n",
        )
        .unwrap();
        assert_eq!(only_edge(&graph).label(), Some("one-to-many"));
    }

    #[test]
    fn test_foreign_key_by_convention_defaults_to_one_to_many() {
        let graph = lower_source("[categories]\n*id\n[items]\n+category_id\n").unwrap();
        let edge = only_edge(&graph);
        assert_eq!(graph.node(edge.target()).key(), "categories");
        assert_eq!(edge.label(), Some(DEFAULT_CARDINALITY));
        assert_eq!(edge.attribute("cardinality"), None);
    }

    #[test]
    fn test_fk_label_without_marker() {
        let graph = lower_source("[a]\n*id\n[b]\nowner {label: \"int, FK(a.id)\"}\n").unwrap();
        let edge = only_edge(&graph);
        assert_eq!(graph.node(edge.target()).key(), "a");
        assert!(graph.node(edge.source()).fields()[0].is_foreign_key());
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let graph = lower_source("[Users]\n*ID\n[Posts]\n+User_ID\nUSERS 1--* posts\n").unwrap();
        assert_eq!(only_edge(&graph).attribute("cardinality"), Some("1--*"));
    }

    #[test]
    fn test_unclaimed_relation_is_undirected() {
        let graph = lower_source("[people]\n[teams]\npeople }|--|{ teams\n").unwrap();
        let edge = only_edge(&graph);
        assert!(!edge.is_directed());
        assert_eq!(edge.label(), Some("many-to-many"));
    }

    #[test]
    fn test_undefined_table_in_relation() {
        let err = lower_source("[users]\nusers ||--o{ ghosts\n").unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E200]);
    }

    #[test]
    fn test_duplicate_table_and_column() {
        let err = lower_source("[t]\nid\nID\n[T]\n").unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E201, ErrorCode::E201]);
    }

    #[test]
    fn test_self_referential_foreign_key() {
        let err = lower_source("[employees]\n*id\nmanager {label: \"FK(employees)\"}\n").unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E202]);
    }

    #[test]
    fn test_invalid_colour() {
        let err = lower_source("[t] {bgcolor: \"not-a-colour\"}\n").unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E203]);
    }

    #[test]
    fn test_unresolvable_foreign_key() {
        let err = lower_source("[t]\n+owner\n").unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E204]);
    }

    #[test]
    fn test_column_outside_table() {
        let err = lower_source("id\n[t]\n").unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E205]);
    }

    #[test]
    fn test_all_errors_collected() {
        let err = lower_source("stray\n[t] {color: \"nope\"}\n+x\nt 1--1 missing\n").unwrap_err();
        assert_eq!(err.diagnostics().len(), 4);
    }
}
