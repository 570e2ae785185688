use trazo_core::{
    Notation, SourceDocument,
    graph::{Graph, NodeCategory, RelationKind},
};
use trazo_parser::{ErrorCode, ParseError, lower, parse};

fn compile(notation: Notation, text: &str) -> Result<Graph, ParseError> {
    lower(parse(&SourceDocument::new(notation, text))?)
}

fn key_of(graph: &Graph, id: trazo_core::graph::NodeId) -> &str {
    graph.node(id).key()
}

#[test]
fn test_infra_web_service() {
    let source = r#"
from diagrams import Diagram, Cluster
from diagrams.aws.compute import EC2
from diagrams.aws.database import RDS
from diagrams.aws.network import ELB

with Diagram("Web Service", direction="TB"):
    lb = ELB("lb")
    with Cluster("Web Tier"):
        web = [EC2("web1"), EC2("web2")]
    db = RDS("userdb")

    lb >> web >> db
"#;
    let graph = compile(Notation::Infra, source).expect("infra source should compile");

    assert_eq!(graph.title(), Some("Web Service"));
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.group_count(), 1);
    assert!(
        graph
            .nodes()
            .all(|(_, n)| n.category() == NodeCategory::Service)
    );

    let db = graph.node(graph.lookup("db").expect("db node"));
    assert_eq!(db.label(), "userdb");
    assert_eq!(db.attribute("provider"), Some("aws"));
    assert_eq!(db.attribute("service"), Some("database"));

    let web1 = graph.lookup("ec2_1").expect("anonymous web node");
    let (group, _) = graph.groups().next().expect("web tier group");
    assert!(graph.is_member(web1, group));
}

#[test]
fn test_infra_three_declared_resources() {
    let graph = compile(
        Notation::Infra,
        "a = EC2(\"a\")\nb = EC2(\"b\")\nc = EC2(\"c\")\na >> b >> c\n",
    )
    .unwrap();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    let pairs: Vec<_> = graph
        .edges()
        .map(|(_, e)| (key_of(&graph, e.source()), key_of(&graph, e.target())))
        .collect();
    assert_eq!(pairs, [("a", "b"), ("b", "c")]);
    assert!(graph.edges().all(|(_, e)| e.is_directed()));
}

#[test]
fn test_er_two_tables_one_foreign_key() {
    let source = r##"
[users] {bgcolor: "#d0e0d0"}
*id {label: "int, not null"}
name {label: "varchar"}

[orders]
*id {label: "int"}
+user_id {label: "int, FK(users)"}

users 1--* orders
"##;
    let graph = compile(Notation::Er, source).unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let (_, edge) = graph.edges().next().unwrap();
    assert_eq!(key_of(&graph, edge.source()), "orders");
    assert_eq!(key_of(&graph, edge.target()), "users");
    assert!(edge.is_directed());
    assert_eq!(edge.relation(), RelationKind::ForeignKey);
    assert_eq!(edge.label(), Some("one-to-many"));
}

#[test]
fn test_data_document() {
    let graph = compile(
        Notation::Data,
        r#"{"service": "api", "ports": [80, 443], "tls": {"enabled": true}}"#,
    )
    .unwrap();
    assert_eq!(graph.node_count(), 7);
    assert_eq!(graph.edge_count(), 6);
    assert!(
        graph
            .edges()
            .all(|(_, e)| e.relation() == RelationKind::Containment)
    );
    let port = graph.node(graph.lookup("$.ports[1]").unwrap());
    assert_eq!(port.label(), "443");
    let enabled = graph.node(graph.lookup("$.tls.enabled").unwrap());
    assert_eq!(enabled.label(), "enabled: true");
}

#[test]
fn test_unterminated_json_object_points_at_brace_line() {
    let source = "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": 2\n";
    let err = compile(Notation::Data, source).unwrap_err();
    let first = err.first().unwrap();
    assert_eq!(first.code(), Some(ErrorCode::E102));
    let position = err.primary_span().unwrap().position(source);
    assert_eq!(position.line, 1);
    assert_eq!(position.column, 1);
    assert!(err.is_syntactic());
}

#[test]
fn test_syntax_error_position() {
    let source = "a = EC2()\nb = EC2()\na >> >> b\n";
    let err = compile(Notation::Infra, source).unwrap_err();
    assert_eq!(err.first().and_then(|d| d.code()), Some(ErrorCode::E100));
    let position = err.primary_span().unwrap().position(source);
    assert_eq!((position.line, position.column), (3, 6));
}

#[test]
fn test_semantic_errors_are_not_syntactic() {
    let err = compile(Notation::Er, "[a]\n[A]\n").unwrap_err();
    assert!(!err.is_syntactic());
    assert_eq!(err.first().and_then(|d| d.code()), Some(ErrorCode::E201));
}
