//! Parser for the entity-relationship notation.
//!
//! Every line is a table header, a column, or a relation. Lines are parsed
//! independently, so all syntax errors in a file are reported together.

use log::trace;
use winnow::{
    Parser as _,
    combinator::{cut_err, eof, opt, peek, repeat, separated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::{any, take_till},
};

use super::{
    ast::{Attribute, Column, Item, Relation, Schema, TableHeader},
    lexer,
    tokens::{PositionedToken, Token},
};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    Label(&'static str),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = Result<O, ErrMode<ContextError<Context>>>;

/// Groups tokens into lines. Newlines inside `{...}` do not end a line.
fn split_lines<'src>(tokens: Vec<PositionedToken<'src>>) -> Vec<Vec<PositionedToken<'src>>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    for token in tokens {
        match token.token {
            Token::Newline if depth == 0 => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            Token::Newline => {}
            ref t if lexer::is_trivia(t) => {}
            _ => {
                match token.token {
                    Token::LeftBrace => depth += 1,
                    Token::RightBrace => depth = depth.saturating_sub(1),
                    _ => {}
                }
                current.push(token);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn punct<'src>(input: &mut Input<'src>, expected: Token<'static>, label: &'static str) -> IResult<Span> {
    any.verify(|t: &PositionedToken<'_>| t.token == expected)
        .map(|t: &PositionedToken<'_>| t.span)
        .context(Context::Label(label))
        .parse_next(input)
}

/// A bare or quoted name.
fn name<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|t: &PositionedToken<'_>| match &t.token {
        Token::Identifier(name) => Some(Spanned::new(name.to_string(), t.span)),
        Token::StringLiteral(name) => Some(Spanned::new(name.clone(), t.span)),
        _ => None,
    })
    .context(Context::Label("name"))
    .parse_next(input)
}

fn attribute_value<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|t: &PositionedToken<'_>| match &t.token {
        Token::StringLiteral(value) => Some(Spanned::new(value.clone(), t.span)),
        Token::Identifier(value) | Token::Number(value) => {
            Some(Spanned::new(value.to_string(), t.span))
        }
        _ => None,
    })
    .context(Context::Label("attribute value"))
    .parse_next(input)
}

/// `key ':' value`
fn attribute<'src>(input: &mut Input<'src>) -> IResult<Attribute> {
    let key = name.parse_next(input)?;
    cut_err(|i: &mut Input<'src>| punct(i, Token::Colon, "`:`")).parse_next(input)?;
    let value = cut_err(attribute_value).parse_next(input)?;
    Ok(Attribute { key, value })
}

/// `'{' (attr (',' attr)* ','?)? '}'`, or nothing.
fn attributes<'src>(input: &mut Input<'src>) -> IResult<Vec<Attribute>> {
    if opt(|i: &mut Input<'src>| punct(i, Token::LeftBrace, "`{`"))
        .parse_next(input)?
        .is_none()
    {
        return Ok(Vec::new());
    }
    let attributes: Vec<_> = separated(0.., attribute, |i: &mut Input<'src>| {
        punct(i, Token::Comma, "`,`")
    })
    .parse_next(input)?;
    opt(|i: &mut Input<'src>| punct(i, Token::Comma, "`,`")).parse_next(input)?;
    cut_err(|i: &mut Input<'src>| punct(i, Token::RightBrace, "`}`")).parse_next(input)?;
    Ok(attributes)
}

/// `'[' name ']' attrs?`
fn table_header<'src>(input: &mut Input<'src>) -> IResult<Item> {
    punct(input, Token::LeftBracket, "`[`")?;
    let name = cut_err(name).parse_next(input)?;
    cut_err(|i: &mut Input<'src>| punct(i, Token::RightBracket, "`]`")).parse_next(input)?;
    let attributes = attributes.parse_next(input)?;
    Ok(Item::Table(TableHeader { name, attributes }))
}

/// `name CARD--CARD name attrs?`
fn relation<'src>(input: &mut Input<'src>) -> IResult<Item> {
    let left = name.parse_next(input)?;
    let (left_cardinality, right_cardinality, operator) = any
        .verify_map(|t: &PositionedToken<'_>| match t.token {
            Token::Relation { left, right, text } => {
                Some((left, right, Spanned::new(text.to_string(), t.span)))
            }
            _ => None,
        })
        .context(Context::Label("relation operator"))
        .parse_next(input)?;
    let right = cut_err(name).parse_next(input)?;
    let attributes = attributes.parse_next(input)?;
    Ok(Item::Relation(Relation {
        left,
        right,
        left_cardinality,
        right_cardinality,
        operator,
        attributes,
    }))
}

/// `('*' | '+')* name (':' type)? attrs?`
///
/// The type is the source text between `:` and the attributes, so
/// `decimal(10, 2)` and `double precision` keep their spelling.
fn column<'src>(input: &mut Input<'src>, source: &str) -> IResult<Item> {
    let markers: Vec<Token<'_>> = repeat(
        0..,
        any.verify_map(|t: &PositionedToken<'_>| match t.token {
            Token::Star | Token::Plus => Some(t.token.clone()),
            _ => None,
        }),
    )
    .parse_next(input)?;
    let name = name.context(Context::Label("column")).parse_next(input)?;

    let data_type = if opt(|i: &mut Input<'src>| punct(i, Token::Colon, "`:`"))
        .parse_next(input)?
        .is_some()
    {
        let type_tokens = cut_err(take_till(1.., |t: &PositionedToken<'_>| {
            t.token == Token::LeftBrace
        }))
        .context(Context::Label("column type"))
        .parse_next(input)?;
        match (type_tokens.first(), type_tokens.last()) {
            (Some(first), Some(last)) => {
                let span = first.span.union(last.span);
                Some(Spanned::new(source[span.start()..span.end()].to_string(), span))
            }
            _ => None,
        }
    } else {
        None
    };

    let attributes = attributes.parse_next(input)?;
    Ok(Item::Column(Column {
        name,
        primary_key: markers.contains(&Token::Star),
        foreign_key: markers.contains(&Token::Plus),
        data_type,
        attributes,
    }))
}

fn line_item<'src>(input: &mut Input<'src>, source: &str) -> IResult<Item> {
    let first = peek(any).parse_next(input)?;
    let item = match first.token {
        Token::LeftBracket => table_header.parse_next(input)?,
        _ => {
            let is_relation = peek(opt((
                name,
                any.verify(|t: &PositionedToken<'_>| matches!(t.token, Token::Relation { .. })),
            )))
            .parse_next(input)?
            .is_some();
            if is_relation {
                relation.parse_next(input)?
            } else {
                column(input, source)?
            }
        }
    };
    cut_err(eof.context(Context::Label("end of line"))).parse_next(input)?;
    Ok(item)
}

fn convert_error(
    error: ErrMode<ContextError<Context>>,
    line: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let expected = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e
            .context()
            .map(|ctx| match ctx {
                Context::Label(label) => *label,
            })
            .last(),
        ErrMode::Incomplete(_) => None,
    };

    let index = line.len() - current_remaining;
    match line.get(index) {
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
            let end = line.last().map_or(0, |t| t.span.end());
            let message = match expected {
                Some(expected) => format!("unexpected end of line, expected {expected}"),
                None => "unexpected end of line".to_string(),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E101)
                .with_label(Span::new(end.saturating_sub(1)..end), "line ends here")
        }
    }
}

fn parse_line(line: &[PositionedToken<'_>], source: &str) -> Result<Spanned<Item>, Diagnostic> {
    let span = match (line.first(), line.last()) {
        (Some(first), Some(last)) => first.span.union(last.span),
        _ => Span::default(),
    };
    let mut input = TokenSlice::new(line);
    line_item(&mut input, source)
        .map(|item| Spanned::new(item, span))
        .map_err(|e| convert_error(e, line, input.eof_offset()))
}

/// Parses entity-relationship source into a [`Schema`].
///
/// # Errors
///
/// Returns every lexical error, or every syntax error found in the lines.
pub fn parse(source: &str) -> Result<Schema, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let lines = split_lines(tokens);
    trace!(lines = lines.len(); "Split entity-relationship source into lines");

    let mut diagnostics = DiagnosticCollector::new();
    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        match parse_line(line, source) {
            Ok(item) => items.push(item),
            Err(diagnostic) => diagnostics.emit(diagnostic),
        }
    }
    diagnostics.finish(Schema { items })
}
