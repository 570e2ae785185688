//! Parser for the infrastructure notation.
//!
//! Parsing happens in three steps:
//!
//! 1. The token stream is cut into logical lines. Newlines inside `(...)` or
//!    `[...]` do not end a line, and comments and blank lines are dropped.
//! 2. Each logical line is parsed on its own by winnow combinators over a
//!    [`TokenSlice`].
//! 3. Lines are nested into `with` blocks by indentation.
//!
//! Every line that fails to parse is reported; lines indented under a
//! failed line are skipped so that one mistake yields one diagnostic.

use log::trace;
use winnow::{
    Parser as _,
    combinator::{alt, cut_err, eof, opt, peek, preceded, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use super::{
    ast::{
        Argument, BlockKind, Call, Chain, ChainOp, Import, ImportName, Link, Literal, Operand,
        Program, Statement, WithBlock,
    },
    lexer,
    tokens::{PositionedToken, Token},
};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    lexer::MAX_NESTING,
    span::{Span, Spanned},
};

/// Tab stops used when measuring indentation.
const TAB_WIDTH: usize = 8;

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = Result<O, ErrMode<ContextError<Context>>>;

/// One logical line of source.
#[derive(Debug)]
struct Line<'src> {
    indent: usize,
    tokens: Vec<PositionedToken<'src>>,
}

impl Line<'_> {
    fn span(&self) -> Span {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.union(last.span),
            _ => Span::default(),
        }
    }
}

/// Result of parsing a single line, before blocks are nested.
enum LineItem {
    Statement(Statement),
    With {
        call: Spanned<Call>,
        alias: Option<Spanned<String>>,
    },
}

/// Measures the indentation of the physical line starting at `line_start`.
fn indentation(source: &str, line_start: usize) -> usize {
    source[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .fold(0, |width, c| match c {
            '\t' => (width / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => width + 1,
        })
}

/// Groups tokens into logical lines, dropping trivia.
fn split_lines<'src>(source: &str, tokens: Vec<PositionedToken<'src>>) -> Vec<Line<'src>> {
    let mut lines = Vec::new();
    let mut current: Vec<PositionedToken<'src>> = Vec::new();
    let mut line_start = 0;
    let mut depth = 0usize;

    for token in tokens {
        match token.token {
            Token::Newline if depth == 0 => {
                if !current.is_empty() {
                    lines.push(Line {
                        indent: indentation(source, line_start),
                        tokens: std::mem::take(&mut current),
                    });
                }
                line_start = token.span.end();
            }
            Token::Newline | Token::Whitespace | Token::Comment(_) => {}
            _ => {
                match token.token {
                    Token::LeftParen | Token::LeftBracket => depth += 1,
                    Token::RightParen | Token::RightBracket => depth = depth.saturating_sub(1),
                    _ => {}
                }
                current.push(token);
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line {
            indent: indentation(source, line_start),
            tokens: current,
        });
    }
    lines
}

// =============================================================================
// Token-level combinators
// =============================================================================

/// Match a token without payload.
fn punct<'src>(input: &mut Input<'src>, expected: Token<'static>, label: &'static str) -> IResult<Span> {
    any.verify(|t: &PositionedToken<'_>| t.token == expected)
        .map(|t: &PositionedToken<'_>| t.span)
        .context(Context::Label(label))
        .parse_next(input)
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|t: &PositionedToken<'_>| match t.token {
        Token::Identifier(name) => Some(Spanned::new(name.to_string(), t.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

/// `ident ('.' ident)*`
fn dotted_name<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    let first = identifier.parse_next(input)?;
    let mut span = first.span();
    let mut name = first.into_inner();
    while opt(|i: &mut Input<'src>| punct(i, Token::Dot, "`.`"))
        .parse_next(input)?
        .is_some()
    {
        let part = cut_err(identifier).parse_next(input)?;
        span = span.union(part.span());
        name.push('.');
        name.push_str(&part);
    }
    Ok(Spanned::new(name, span))
}

fn literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<Literal>> {
    let negative = opt(|i: &mut Input<'src>| punct(i, Token::Minus, "`-`")).parse_next(input)?;
    if let Some(minus) = negative {
        return cut_err(any.verify_map(|t: &PositionedToken<'_>| match t.token {
            Token::NumberLiteral(n) => Some(Spanned::new(Literal::Number(-n), minus.union(t.span))),
            _ => None,
        }))
        .context(Context::Label("number"))
        .parse_next(input);
    }

    alt((
        any.verify_map(|t: &PositionedToken<'_>| {
            let literal = match &t.token {
                Token::StringLiteral(s) => Literal::String(s.clone()),
                Token::NumberLiteral(n) => Literal::Number(*n),
                Token::True => Literal::Bool(true),
                Token::False => Literal::Bool(false),
                Token::None => Literal::None,
                _ => return None,
            };
            Some(Spanned::new(literal, t.span))
        }),
        dotted_name.map(|name| name.map(Literal::Name)),
    ))
    .context(Context::Label("value"))
    .parse_next(input)
}

/// `(name '=')? literal`
fn argument<'src>(input: &mut Input<'src>) -> IResult<Spanned<Argument>> {
    let name = opt(terminated(identifier, |i: &mut Input<'src>| {
        punct(i, Token::Equals, "`=`")
    }))
    .parse_next(input)?;
    // A bare value may be absent (trailing comma); a named one may not.
    let value = if name.is_some() {
        cut_err(literal).parse_next(input)?
    } else {
        literal.parse_next(input)?
    };

    let span = name
        .as_ref()
        .map_or(value.span(), |n| n.span().union(value.span()));
    Ok(Spanned::new(Argument { name, value }, span))
}

/// `'(' (arg (',' arg)* ','?)? ')'`, returning the arguments and the closing span.
fn arguments<'src>(input: &mut Input<'src>) -> IResult<(Vec<Spanned<Argument>>, Span)> {
    punct(input, Token::LeftParen, "`(`")?;
    let args: Vec<_> = separated(0.., argument, |i: &mut Input<'src>| {
        punct(i, Token::Comma, "`,`")
    })
    .parse_next(input)?;
    opt(|i: &mut Input<'src>| punct(i, Token::Comma, "`,`")).parse_next(input)?;
    let close = cut_err(|i: &mut Input<'src>| punct(i, Token::RightParen, "`)`")).parse_next(input)?;
    Ok((args, close))
}

/// `dotted '(' args ')'`
fn call<'src>(input: &mut Input<'src>) -> IResult<Spanned<Call>> {
    let callee = dotted_name.parse_next(input)?;
    let (args, close) = arguments.parse_next(input)?;
    let span = callee.span().union(close);
    Ok(Spanned::new(Call { callee, args }, span))
}

/// A name, a call, or a bracketed list of operands.
fn operand<'src>(input: &mut Input<'src>) -> IResult<Spanned<Operand>> {
    if let Some(open) =
        opt(|i: &mut Input<'src>| punct(i, Token::LeftBracket, "`[`")).parse_next(input)?
    {
        let items: Vec<_> = cut_err(separated(1.., operand, |i: &mut Input<'src>| {
            punct(i, Token::Comma, "`,`")
        }))
        .parse_next(input)?;
        opt(|i: &mut Input<'src>| punct(i, Token::Comma, "`,`")).parse_next(input)?;
        let close =
            cut_err(|i: &mut Input<'src>| punct(i, Token::RightBracket, "`]`")).parse_next(input)?;
        return Ok(Spanned::new(Operand::List(items), open.union(close)));
    }

    let name = dotted_name
        .context(Context::Label("resource"))
        .parse_next(input)?;
    if peek(opt(|i: &mut Input<'src>| punct(i, Token::LeftParen, "`(`")))
        .parse_next(input)?
        .is_some()
    {
        let (args, close) = cut_err(arguments).parse_next(input)?;
        let span = name.span().union(close);
        return Ok(Spanned::new(Operand::Call(Call { callee: name, args }), span));
    }
    Ok(name.map(Operand::Name))
}

fn chain_op<'src>(input: &mut Input<'src>) -> IResult<Spanned<ChainOp>> {
    any.verify_map(|t: &PositionedToken<'_>| {
        let op = match t.token {
            Token::Forward => ChainOp::Forward,
            Token::Backward => ChainOp::Backward,
            Token::Minus => ChainOp::Undirected,
            _ => return None,
        };
        Some(Spanned::new(op, t.span))
    })
    .context(Context::Label("`>>`, `<<` or `-`"))
    .parse_next(input)
}

/// `operand (op [Edge(...) op] operand)*`
fn chain<'src>(input: &mut Input<'src>) -> IResult<Chain> {
    let head = operand.parse_next(input)?;
    let mut links = Vec::new();

    while let Some(op) = opt(chain_op).parse_next(input)? {
        let next = cut_err(operand).parse_next(input)?;
        let span = next.span();
        let link = match next.into_inner() {
            Operand::Call(edge) if edge.kind() == "Edge" => {
                let second = cut_err(chain_op).parse_next(input)?;
                let target = cut_err(operand).parse_next(input)?;
                Link {
                    op: Spanned::new(op.combine(*second), op.span().union(second.span())),
                    edge: Some(Spanned::new(edge, span)),
                    operand: target,
                }
            }
            operand => Link {
                op,
                edge: None,
                operand: Spanned::new(operand, span),
            },
        };
        links.push(link);
    }

    Ok(Chain { head, links })
}

/// `import_name := ident ('as' ident)?`
fn import_name<'src>(input: &mut Input<'src>) -> IResult<ImportName> {
    let name = identifier.parse_next(input)?;
    let alias = opt(preceded(
        |i: &mut Input<'src>| punct(i, Token::As, "`as`"),
        cut_err(identifier),
    ))
    .parse_next(input)?;
    Ok(ImportName { name, alias })
}

/// `from dotted import names` or `from dotted import (names)`
fn import_from<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    punct(input, Token::From, "`from`")?;
    let module = cut_err(dotted_name).parse_next(input)?;
    cut_err(|i: &mut Input<'src>| punct(i, Token::Import, "`import`")).parse_next(input)?;

    let parenthesized =
        opt(|i: &mut Input<'src>| punct(i, Token::LeftParen, "`(`")).parse_next(input)?;
    let names: Vec<_> = cut_err(separated(1.., import_name, |i: &mut Input<'src>| {
        punct(i, Token::Comma, "`,`")
    }))
    .parse_next(input)?;
    if parenthesized.is_some() {
        opt(|i: &mut Input<'src>| punct(i, Token::Comma, "`,`")).parse_next(input)?;
        cut_err(|i: &mut Input<'src>| punct(i, Token::RightParen, "`)`")).parse_next(input)?;
    }

    Ok(Statement::Import(Import {
        module,
        names,
        alias: None,
    }))
}

/// `import dotted ('as' ident)?`
fn import_module<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    punct(input, Token::Import, "`import`")?;
    let module = cut_err(dotted_name).parse_next(input)?;
    let alias = opt(preceded(
        |i: &mut Input<'src>| punct(i, Token::As, "`as`"),
        cut_err(identifier),
    ))
    .parse_next(input)?;
    Ok(Statement::Import(Import {
        module,
        names: Vec::new(),
        alias,
    }))
}

/// `with call ('as' ident)? ':'`
fn with_header<'src>(input: &mut Input<'src>) -> IResult<LineItem> {
    punct(input, Token::With, "`with`")?;
    let call = cut_err(call).parse_next(input)?;
    let alias = opt(preceded(
        |i: &mut Input<'src>| punct(i, Token::As, "`as`"),
        cut_err(identifier),
    ))
    .parse_next(input)?;
    cut_err(|i: &mut Input<'src>| punct(i, Token::Colon, "`:`")).parse_next(input)?;
    Ok(LineItem::With { call, alias })
}

/// `ident '=' chain`
fn assignment<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    let target = identifier.parse_next(input)?;
    punct(input, Token::Equals, "`=`")?;
    let value = cut_err(chain).parse_next(input)?;
    Ok(Statement::Assign { target, value })
}

/// Parse one logical line, which must be consumed completely.
fn line_item<'src>(input: &mut Input<'src>) -> IResult<LineItem> {
    let first = peek(any).parse_next(input)?;
    let item = match first.token {
        Token::From => import_from.map(LineItem::Statement).parse_next(input)?,
        Token::Import => import_module.map(LineItem::Statement).parse_next(input)?,
        Token::With => with_header.parse_next(input)?,
        _ => {
            let is_assignment = peek(opt((identifier, |i: &mut Input<'src>| {
                punct(i, Token::Equals, "`=`")
            })))
            .parse_next(input)?
            .is_some();
            if is_assignment {
                LineItem::Statement(assignment.parse_next(input)?)
            } else {
                LineItem::Statement(Statement::Chain(chain.parse_next(input)?))
            }
        }
    };
    cut_err(eof.context(Context::Label("end of line"))).parse_next(input)?;
    Ok(item)
}

/// Convert a winnow error on `line` into a diagnostic at the offending token.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    line: &Line<'_>,
    current_remaining: usize,
) -> Diagnostic {
    // Labels are pushed innermost first; the outermost reads best.
    let expected = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e
            .context()
            .map(|ctx| match ctx {
                Context::Label(label) => *label,
            })
            .last(),
        ErrMode::Incomplete(_) => None,
    };

    let index = line.tokens.len() - current_remaining;
    match line.tokens.get(index) {
        Some(token) => {
            let message = match expected {
                Some(expected) => format!("unexpected `{}`, expected {expected}", token.token),
                None => format!("unexpected `{}`", token.token),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(token.span, "unexpected token")
        }
        None => {
            let end = line.span().end();
            let message = match expected {
                Some(expected) => format!("unexpected end of line, expected {expected}"),
                None => "unexpected end of line".to_string(),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E101)
                .with_label(Span::new(end.saturating_sub(1)..end), "line ends here")
                .with_help("close every open `(` and `[`")
        }
    }
}

fn parse_line(line: &Line<'_>) -> Result<LineItem, Diagnostic> {
    let mut input = TokenSlice::new(&line.tokens);
    line_item
        .parse_next(&mut input)
        .map_err(|e| convert_error(e, line, input.eof_offset()))
}

fn block_kind(call: &Spanned<Call>) -> Result<BlockKind, Diagnostic> {
    match call.kind() {
        "Diagram" => Ok(BlockKind::Diagram),
        "Cluster" => Ok(BlockKind::Cluster),
        other => Err(Diagnostic::error(format!(
            "`with {other}(...)` is not supported"
        ))
        .with_code(ErrorCode::E100)
        .with_label(call.callee.span(), "unknown context")
        .with_help("blocks are opened with `with Diagram(...)` or `with Cluster(...)`")),
    }
}

/// Nests logical lines into blocks by indentation.
struct BlockBuilder<'l, 'src> {
    lines: &'l [Line<'src>],
    next: usize,
    /// Number of enclosing `with` blocks.
    depth: usize,
    diagnostics: DiagnosticCollector,
}

impl<'l, 'src> BlockBuilder<'l, 'src> {
    fn new(lines: &'l [Line<'src>]) -> Self {
        Self {
            lines,
            next: 0,
            depth: 0,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Skips every line indented deeper than `indent`.
    fn skip_nested(&mut self, indent: usize) {
        while self.lines.get(self.next).is_some_and(|l| l.indent > indent) {
            self.next += 1;
        }
    }

    fn block(&mut self, indent: usize) -> Vec<Spanned<Statement>> {
        let mut statements = Vec::new();

        while let Some(line) = self.lines.get(self.next) {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                self.diagnostics.emit(
                    Diagnostic::error("unexpected indentation")
                        .with_code(ErrorCode::E103)
                        .with_label(line.span(), "indented without an enclosing `with`")
                        .with_help("only the body of a `with` block may be indented"),
                );
                self.skip_nested(indent);
                continue;
            }

            self.next += 1;
            let span = line.span();
            match parse_line(line) {
                Ok(LineItem::Statement(statement)) => {
                    statements.push(Spanned::new(statement, span));
                }
                Ok(LineItem::With { call, alias }) => {
                    let body_indent = match self.lines.get(self.next) {
                        Some(next) if next.indent > indent => next.indent,
                        _ => {
                            self.diagnostics.emit(
                                Diagnostic::error("expected an indented block")
                                    .with_code(ErrorCode::E103)
                                    .with_label(span, "block has no body"),
                            );
                            continue;
                        }
                    };
                    if self.depth >= MAX_NESTING {
                        self.diagnostics.emit(
                            Diagnostic::error(format!(
                                "`with` blocks nested more than {MAX_NESTING} levels deep"
                            ))
                            .with_code(ErrorCode::E104)
                            .with_label(span, "too deeply nested"),
                        );
                        self.skip_nested(indent);
                        continue;
                    }
                    self.depth += 1;
                    let body = self.block(body_indent);
                    self.depth -= 1;
                    if let Some(dedent) = self.lines.get(self.next).filter(|l| l.indent > indent) {
                        self.diagnostics.emit(
                            Diagnostic::error("unindent does not match any outer indentation level")
                                .with_code(ErrorCode::E103)
                                .with_label(dedent.span(), "inconsistent dedent"),
                        );
                        self.skip_nested(indent);
                    }
                    match block_kind(&call) {
                        Ok(kind) => statements.push(Spanned::new(
                            Statement::With(WithBlock {
                                kind,
                                call,
                                alias,
                                body,
                            }),
                            span,
                        )),
                        Err(diagnostic) => self.diagnostics.emit(diagnostic),
                    }
                }
                Err(diagnostic) => {
                    self.diagnostics.emit(diagnostic);
                    self.skip_nested(indent);
                }
            }
        }

        statements
    }

    fn finish(mut self) -> Result<Program, ParseError> {
        let statements = self.block(0);
        self.diagnostics.finish(Program { statements })
    }
}

/// Parses infrastructure source into a [`Program`].
///
/// # Errors
///
/// Returns every lexical error, or every syntax error found in the lines.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = lexer::tokenize(source)?;
    crate::lexer::check_nesting(&tokens, |t| {
        let change = match t.token {
            Token::LeftParen | Token::LeftBracket => 1,
            Token::RightParen | Token::RightBracket => -1,
            _ => 0,
        };
        (change, t.span)
    })?;
    let lines = split_lines(source, tokens);
    trace!(lines = lines.len(); "Split infrastructure source into logical lines");

    let mut builder = BlockBuilder::new(&lines);
    if let Some(first) = lines.first().filter(|l| l.indent > 0) {
        builder.diagnostics.emit(
            Diagnostic::error("unexpected indentation")
                .with_code(ErrorCode::E103)
                .with_label(first.span(), "first statement is indented"),
        );
        builder.skip_nested(0);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        match parse(source) {
            Ok(program) => program,
            Err(err) => panic!("failed to parse {source:?}: {err}"),
        }
    }

    fn first_error(source: &str) -> Diagnostic {
        parse(source).unwrap_err().diagnostics()[0].clone()
    }

    fn names(chain: &Chain) -> Vec<String> {
        std::iter::once(&chain.head)
            .chain(chain.links.iter().map(|l| &l.operand))
            .map(|o| match o.inner() {
                Operand::Name(n) => n.clone(),
                Operand::Call(c) => c.kind().to_string(),
                Operand::List(items) => format!("[{}]", items.len()),
            })
            .collect()
    }

    #[test]
    fn test_simple_chain() {
        let program = parse_ok("a >> b >> c\n");
        assert_eq!(program.statements.len(), 1);
        let Statement::Chain(chain) = program.statements[0].inner() else {
            panic!("expected chain");
        };
        assert_eq!(names(chain), ["a", "b", "c"]);
        assert!(chain.links.iter().all(|l| *l.op == ChainOp::Forward));
    }

    #[test]
    fn test_assignment_with_call() {
        let program = parse_ok(r#"web = EC2("web server", tag="x")"#);
        let Statement::Assign { target, value } = program.statements[0].inner() else {
            panic!("expected assignment");
        };
        assert_eq!(target.inner(), "web");
        let Operand::Call(call) = value.head.inner() else {
            panic!("expected call");
        };
        assert_eq!(call.kind(), "EC2");
        assert_eq!(
            call.positional(0).map(|l| l.to_text()),
            Some("web server".to_string())
        );
        assert_eq!(call.keyword("tag").map(|l| l.to_text()), Some("x".to_string()));
    }

    #[test]
    fn test_imports() {
        let program = parse_ok(
            "from diagrams.aws.compute import EC2, Lambda as Fn\nimport diagrams.aws.database as db\n",
        );
        let Statement::Import(from) = program.statements[0].inner() else {
            panic!("expected import");
        };
        assert_eq!(from.module.inner(), "diagrams.aws.compute");
        assert_eq!(from.names[1].binding(), "Fn");

        let Statement::Import(plain) = program.statements[1].inner() else {
            panic!("expected import");
        };
        assert!(plain.names.is_empty());
        assert_eq!(plain.alias.as_ref().map(|a| a.inner().as_str()), Some("db"));
    }

    #[test]
    fn test_with_blocks_nest_by_indentation() {
        let source = "\
with Diagram(\"Web\", direction=\"LR\"):
    lb = ELB(\"lb\")
    with Cluster(\"Services\"):
        web = EC2(\"web\")
    lb >> web
";
        let program = parse_ok(source);
        assert_eq!(program.statements.len(), 1);
        let Statement::With(diagram) = program.statements[0].inner() else {
            panic!("expected with block");
        };
        assert_eq!(diagram.kind, BlockKind::Diagram);
        assert_eq!(diagram.body.len(), 3);
        let Statement::With(cluster) = diagram.body[1].inner() else {
            panic!("expected nested cluster");
        };
        assert_eq!(cluster.kind, BlockKind::Cluster);
        assert_eq!(cluster.body.len(), 1);
    }

    #[test]
    fn test_list_operands_and_multiline_brackets() {
        let program = parse_ok("lb >> [\n    web1,\n    web2,\n] >> db\n");
        let Statement::Chain(chain) = program.statements[0].inner() else {
            panic!("expected chain");
        };
        assert_eq!(names(chain), ["lb", "[2]", "db"]);
    }

    #[test]
    fn test_edge_modifier() {
        let program = parse_ok(r#"a >> Edge(label="https") >> b"#);
        let Statement::Chain(chain) = program.statements[0].inner() else {
            panic!("expected chain");
        };
        assert_eq!(chain.links.len(), 1);
        let link = &chain.links[0];
        assert_eq!(*link.op, ChainOp::Forward);
        assert_eq!(
            link.edge.as_ref().and_then(|e| e.keyword("label")).map(|l| l.to_text()),
            Some("https".to_string())
        );
    }

    #[test]
    fn test_mixed_edge_operators_are_bidirectional() {
        let program = parse_ok("a >> Edge() << b");
        let Statement::Chain(chain) = program.statements[0].inner() else {
            panic!("expected chain");
        };
        assert_eq!(*chain.links[0].op, ChainOp::Both);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let program = parse_ok("# header\n\na >> b  # trailing\n\n");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_unexpected_token() {
        let diag = first_error("a >> >> b");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.primary_span(), Some(Span::new(5..7)));
    }

    #[test]
    fn test_unclosed_call() {
        let diag = first_error("web = EC2(\"web\"\n");
        assert_eq!(diag.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_unexpected_indent() {
        let diag = first_error("a >> b\n    c >> d\n");
        assert_eq!(diag.code(), Some(ErrorCode::E103));
        assert_eq!(diag.primary_span().unwrap().position("a >> b\n    c >> d\n").line, 2);
    }

    #[test]
    fn test_with_without_body() {
        let diag = first_error("with Cluster(\"x\"):\na >> b\n");
        assert_eq!(diag.code(), Some(ErrorCode::E103));
    }

    #[test]
    fn test_unknown_context_manager() {
        let diag = first_error("with open(\"f\"):\n    a >> b\n");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_every_bad_line_reported() {
        let err = parse("a >> \nb = \nc >> d\n").unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_deeply_nested_list_is_rejected() {
        let source = format!("a >> {}b{}\n", "[".repeat(10_000), "]".repeat(10_000));
        let diag = first_error(&source);
        assert_eq!(diag.code(), Some(ErrorCode::E104));
    }

    #[test]
    fn test_deeply_nested_with_blocks_are_rejected() {
        let mut source = String::new();
        for level in 0..=MAX_NESTING {
            source.push_str(&" ".repeat(level));
            source.push_str(&format!("with Cluster(\"c{level}\"):\n"));
        }
        source.push_str(&" ".repeat(MAX_NESTING + 1));
        source.push_str("a >> b\n");

        let diag = first_error(&source);
        assert_eq!(diag.code(), Some(ErrorCode::E104));
        assert_eq!(diag.primary_span().unwrap().position(&source).line, MAX_NESTING + 1);
    }

    #[test]
    fn test_undefined_names_are_not_syntax_errors() {
        assert!(parse("nobody >> nowhere").is_ok());
    }

    #[test]
    fn test_tab_indentation() {
        let program = parse_ok("with Cluster(\"x\"):\n\ta >> b\n");
        let Statement::With(block) = program.statements[0].inner() else {
            panic!("expected with block");
        };
        assert_eq!(block.body.len(), 1);
    }
}
