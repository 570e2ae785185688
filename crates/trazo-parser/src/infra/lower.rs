//! Lowering of infrastructure programs into the unified graph.
//!
//! Every assigned resource becomes a `Service` node keyed by its variable
//! name. Calls written inline in a chain become anonymous resources keyed
//! `<kind>_<n>`. Each link of a chain becomes one `Flow` edge per pair of
//! endpoints, so list operands fan out.

use indexmap::IndexMap;
use log::{debug, trace};

use trazo_core::{
    color::Color,
    graph::{Direction, Graph, GraphError, GroupId, Node, NodeCategory, NodeId, RelationKind},
    style::StrokeStyle,
};

use super::ast::{BlockKind, Call, Chain, ChainOp, Import, Operand, Program, Statement, WithBlock};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
};

/// Where an imported resource kind comes from.
#[derive(Debug, Clone)]
struct Provenance {
    provider: String,
    service: String,
}

impl Provenance {
    /// Reads `diagrams.<provider>.<service>` module paths.
    fn from_module(module: &str) -> Option<Self> {
        let mut parts = module.split('.');
        if parts.next()? != "diagrams" {
            return None;
        }
        let provider = parts.next()?.to_string();
        let service = parts.next().unwrap_or("general").to_string();
        Some(Self { provider, service })
    }
}

/// Nodes a variable name is bound to.
#[derive(Debug)]
struct Binding {
    nodes: Vec<NodeId>,
    span: Span,
}

struct Lowerer {
    graph: Graph,
    diagnostics: DiagnosticCollector,
    /// Imported names (after aliasing) to their source module.
    imported_kinds: IndexMap<String, Provenance>,
    /// `import x.y as z` aliases to their module path.
    module_aliases: IndexMap<String, String>,
    bindings: IndexMap<String, Binding>,
    anonymous_counters: IndexMap<String, usize>,
    group: Option<GroupId>,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            diagnostics: DiagnosticCollector::new(),
            imported_kinds: IndexMap::new(),
            module_aliases: IndexMap::new(),
            bindings: IndexMap::new(),
            anonymous_counters: IndexMap::new(),
            group: None,
        }
    }

    fn statements(&mut self, statements: Vec<Spanned<Statement>>) {
        for statement in statements {
            match statement.into_inner() {
                Statement::Import(import) => self.import(import),
                Statement::With(block) => self.with_block(block),
                Statement::Assign { target, value } => self.assign(target, value),
                Statement::Chain(chain) => {
                    self.chain(&chain);
                }
            }
        }
    }

    fn import(&mut self, import: Import) {
        let module = import.module.into_inner();
        if import.names.is_empty() {
            let binding = import
                .alias
                .map_or_else(|| module.clone(), Spanned::into_inner);
            self.module_aliases.insert(binding, module);
            return;
        }

        if let Some(provenance) = Provenance::from_module(&module) {
            for name in &import.names {
                self.imported_kinds
                    .insert(name.binding().to_string(), provenance.clone());
            }
        }
    }

    fn with_block(&mut self, block: WithBlock) {
        let WithBlock {
            kind, call, body, ..
        } = block;

        match kind {
            BlockKind::Diagram => {
                if let Some(title) = call.positional(0).or_else(|| call.keyword("name")) {
                    self.graph.set_title(title.to_text());
                }
                if let Some(direction) = call.keyword("direction") {
                    let code = direction.to_text();
                    match Direction::from_code(&code) {
                        Some(direction) => self.graph.set_direction(direction),
                        None => {
                            let reversed = matches!(code.to_ascii_uppercase().as_str(), "BT" | "RL");
                            let (message, label) = if reversed {
                                (format!("direction `{code}` is not supported"), "reversed direction")
                            } else {
                                (format!("invalid direction `{code}`"), "unknown direction")
                            };
                            self.diagnostics.emit(
                                Diagnostic::error(message)
                                    .with_code(ErrorCode::E203)
                                    .with_label(direction.span(), label)
                                    .with_help("use \"TB\" or \"LR\""),
                            );
                        }
                    }
                }
                self.statements(body);
            }
            BlockKind::Cluster => {
                let label = call
                    .positional(0)
                    .or_else(|| call.keyword("label"))
                    .map_or_else(|| "Cluster".to_string(), |l| l.to_text());
                let parent = self.group;
                match self.graph.add_group(label, parent) {
                    Ok(group) => {
                        self.group = Some(group);
                        self.statements(body);
                        self.group = parent;
                    }
                    Err(err) => self.graph_error(err, call.span()),
                }
            }
        }
    }

    fn assign(&mut self, target: Spanned<String>, value: Chain) {
        if let Some(existing) = self.bindings.get(target.inner()) {
            self.diagnostics.emit(
                Diagnostic::error(format!("resource `{}` is defined multiple times", *target))
                    .with_code(ErrorCode::E201)
                    .with_label(target.span(), "duplicate definition")
                    .with_related_label(existing.span, "first defined here")
                    .with_help("give each resource its own name"),
            );
            return;
        }

        let nodes = match (value.head.inner(), value.links.is_empty()) {
            // `web = EC2("web")`: the resource takes the variable name.
            (Operand::Call(call), true) => self
                .resource(target.inner().clone(), call, value.head.span())
                .into_iter()
                .collect(),
            _ => self.chain(&value),
        };

        trace!(name = target.inner().as_str(), nodes = nodes.len(); "Bound resource name");
        self.bindings.insert(
            target.inner().clone(),
            Binding {
                nodes,
                span: target.span(),
            },
        );
    }

    /// Lowers a chain and returns the nodes of its last operand.
    fn chain(&mut self, chain: &Chain) -> Vec<NodeId> {
        let mut previous = self.operand(&chain.head);

        for link in &chain.links {
            let next = self.operand(&link.operand);
            let (label, attributes) = match &link.edge {
                Some(edge) => self.edge_style(edge),
                None => (None, Vec::new()),
            };

            for &left in &previous {
                for &right in &next {
                    let (source, target) = match *link.op {
                        ChainOp::Backward => (right, left),
                        _ => (left, right),
                    };
                    let added = self
                        .graph
                        .add_edge(source, target, RelationKind::Flow)
                        .map(|mut edge| {
                            match *link.op {
                                ChainOp::Undirected => {
                                    edge.set_directed(false);
                                }
                                ChainOp::Both => {
                                    edge.set_attribute("bidirectional", "true");
                                }
                                ChainOp::Forward | ChainOp::Backward => {}
                            }
                            if let Some(label) = &label {
                                edge.set_label(label.clone());
                            }
                            for (name, value) in &attributes {
                                edge.set_attribute(name.clone(), value.clone());
                            }
                        });
                    if let Err(err) = added {
                        self.graph_error(err, link.op.span());
                    }
                }
            }
            previous = next;
        }

        previous
    }

    fn operand(&mut self, operand: &Spanned<Operand>) -> Vec<NodeId> {
        match operand.inner() {
            Operand::Name(name) => match self.bindings.get(name) {
                Some(binding) => binding.nodes.clone(),
                None => {
                    self.diagnostics.emit(
                        Diagnostic::error(format!("undefined resource `{name}`"))
                            .with_code(ErrorCode::E200)
                            .with_label(operand.span(), "not defined")
                            .with_help(format!(
                                "assign it before use, e.g. `{name} = EC2(\"{name}\")`"
                            )),
                    );
                    Vec::new()
                }
            },
            Operand::Call(call) if call.kind() == "Edge" => {
                self.diagnostics.emit(
                    Diagnostic::error("`Edge(...)` must sit between two chain operators")
                        .with_code(ErrorCode::E203)
                        .with_label(operand.span(), "misplaced edge")
                        .with_help("write `a >> Edge(label=\"...\") >> b`"),
                );
                Vec::new()
            }
            Operand::Call(call) => {
                let key = self.anonymous_key(call.kind());
                self.resource(key, call, operand.span()).into_iter().collect()
            }
            Operand::List(items) => items.iter().flat_map(|item| self.operand(item)).collect(),
        }
    }

    /// Next free `<kind>_<n>` key for an inline resource.
    fn anonymous_key(&mut self, kind: &str) -> String {
        let prefix = kind.to_lowercase();
        let counter = self.anonymous_counters.entry(prefix.clone()).or_insert(0);
        loop {
            *counter += 1;
            let key = format!("{prefix}_{counter}");
            if self.graph.lookup(&key).is_none() && !self.bindings.contains_key(&key) {
                return key;
            }
        }
    }

    fn resource(&mut self, key: String, call: &Call, span: Span) -> Option<NodeId> {
        let kind = call.kind();
        let label = call
            .positional(0)
            .or_else(|| call.keyword("label"))
            .map_or_else(|| kind.to_string(), |l| l.to_text());

        let mut node = Node::new(key, label, NodeCategory::Service)
            .with_attribute("kind", kind)
            .with_group(self.group);
        if let Some(provenance) = self.provenance(call) {
            node = node
                .with_attribute("provider", provenance.provider)
                .with_attribute("service", provenance.service);
        }
        for arg in &call.args {
            if let Some(name) = arg.name.as_ref().filter(|n| n.inner() != "label") {
                node = node.with_attribute(name.inner().clone(), arg.value.to_text());
            }
        }

        match self.graph.add_node(node) {
            Ok(id) => Some(id),
            Err(err) => {
                self.graph_error(err, span);
                None
            }
        }
    }

    /// Resolves the provider and service of a resource kind.
    fn provenance(&self, call: &Call) -> Option<Provenance> {
        match call.callee.rsplit_once('.') {
            Some((module, _)) => {
                let (head, rest) = module.split_once('.').unwrap_or((module, ""));
                let resolved = match self.module_aliases.get(head) {
                    Some(path) if rest.is_empty() => path.clone(),
                    Some(path) => format!("{path}.{rest}"),
                    None => module.to_string(),
                };
                Provenance::from_module(&resolved)
            }
            None => self.imported_kinds.get(call.kind()).cloned(),
        }
    }

    /// Reads the label and validated style attributes of an `Edge(...)` modifier.
    fn edge_style(&mut self, edge: &Spanned<Call>) -> (Option<String>, Vec<(String, String)>) {
        let label = edge
            .keyword("label")
            .or_else(|| edge.positional(0))
            .map(|l| l.to_text());

        let mut attributes = Vec::new();
        if let Some(color) = edge.keyword("color") {
            let text = color.to_text();
            match Color::new(&text) {
                Ok(_) => attributes.push(("color".to_string(), text)),
                Err(err) => self.invalid_attribute(color.span(), "color", &err),
            }
        }
        if let Some(style) = edge.keyword("style") {
            let text = style.to_text();
            match text.parse::<StrokeStyle>() {
                Ok(_) => attributes.push(("style".to_string(), text)),
                Err(err) => self.invalid_attribute(style.span(), "style", &err),
            }
        }
        (label, attributes)
    }

    fn invalid_attribute(&mut self, span: Span, name: &str, reason: &str) {
        self.diagnostics.emit(
            Diagnostic::error(format!("invalid edge {name}: {reason}"))
                .with_code(ErrorCode::E203)
                .with_label(span, "invalid value"),
        );
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

    fn finish(self) -> Result<Graph, ParseError> {
        self.diagnostics.finish(self.graph)
    }
}

/// Lowers an infrastructure [`Program`] into a [`Graph`].
///
/// # Errors
///
/// Returns every semantic error found: undefined resources (E200), duplicate
/// resource names (E201) and invalid attribute values (E203).
pub fn lower(program: Program) -> Result<Graph, ParseError> {
    let mut lowerer = Lowerer::new();
    lowerer.statements(program.statements);
    let graph = lowerer.finish()?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        groups = graph.group_count();
        "Lowered infrastructure program"
    );
    Ok(graph)
}
