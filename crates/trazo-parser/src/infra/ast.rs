//! Syntax tree of the infrastructure notation.

use crate::span::Spanned;

/// A whole infrastructure source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Spanned<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(Import),
    With(WithBlock),
    /// `name = <chain>`; a single resource call is a chain of one operand.
    Assign {
        target: Spanned<String>,
        value: Chain,
    },
    Chain(Chain),
}

/// `from module import a, b as c` or `import module as alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Dotted module path, e.g. `diagrams.aws.compute`.
    pub module: Spanned<String>,
    /// Imported names with optional alias; empty for a plain `import`.
    pub names: Vec<ImportName>,
    /// Alias of a plain `import module as alias`.
    pub alias: Option<Spanned<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportName {
    pub name: Spanned<String>,
    pub alias: Option<Spanned<String>>,
}

impl ImportName {
    /// The name the import binds in the file.
    pub fn binding(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

/// Context manager that opens a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `with Diagram(...)`: sets title and direction.
    Diagram,
    /// `with Cluster(...)`: opens a group.
    Cluster,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithBlock {
    pub kind: BlockKind,
    pub call: Spanned<Call>,
    pub alias: Option<Spanned<String>>,
    pub body: Vec<Spanned<Statement>>,
}

/// A call such as `EC2("web")` or `aws.compute.EC2("web", tag="x")`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Dotted callee path as written.
    pub callee: Spanned<String>,
    pub args: Vec<Spanned<Argument>>,
}

impl Call {
    /// Last segment of the callee path (`EC2` for `aws.compute.EC2`).
    pub fn kind(&self) -> &str {
        self.callee.rsplit('.').next().unwrap_or(&self.callee)
    }

    /// First positional argument.
    pub fn positional(&self, index: usize) -> Option<&Spanned<Literal>> {
        self.args
            .iter()
            .filter(|a| a.name.is_none())
            .nth(index)
            .map(|a| &a.value)
    }

    /// Keyword argument by name.
    pub fn keyword(&self, name: &str) -> Option<&Spanned<Literal>> {
        self.args
            .iter()
            .find(|a| a.name.as_ref().is_some_and(|n| n.inner() == name))
            .map(|a| &a.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Spanned<String>>,
    pub value: Spanned<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    None,
    /// A bare name, such as a variable passed as an argument.
    Name(String),
}

impl Literal {
    /// Text form used for labels and attributes.
    pub fn to_text(&self) -> String {
        match self {
            Literal::String(s) | Literal::Name(s) => s.clone(),
            Literal::Number(n) => n.to_string(),
            Literal::Bool(true) => "True".to_string(),
            Literal::Bool(false) => "False".to_string(),
            Literal::None => "None".to_string(),
        }
    }
}

/// `operand (op operand)*`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub head: Spanned<Operand>,
    pub links: Vec<Link>,
}

/// One connection step of a chain and the operand it leads to.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub op: Spanned<ChainOp>,
    /// `Edge(...)` modifier written between two operators.
    pub edge: Option<Spanned<Call>>,
    pub operand: Spanned<Operand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    /// `>>`: left flows into right.
    Forward,
    /// `<<`: right flows into left.
    Backward,
    /// `-`: undirected.
    Undirected,
    /// `>> Edge(...) <<` or `<< Edge(...) >>`: both ways.
    Both,
}

impl ChainOp {
    /// Merges the operators on either side of an `Edge(...)` modifier.
    pub fn combine(self, other: ChainOp) -> ChainOp {
        match (self, other) {
            (a, b) if a == b => a,
            (ChainOp::Undirected, x) | (x, ChainOp::Undirected) => x,
            _ => ChainOp::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Name(String),
    Call(Call),
    List(Vec<Spanned<Operand>>),
}
