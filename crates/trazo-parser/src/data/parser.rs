//! Recursive-descent JSON parser over the token stream.

use winnow::{
    Parser as _,
    combinator::{cut_err, eof, opt, peek},
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use super::{
    ast::{Document, Member, Value},
    lexer,
    tokens::{PositionedToken, Token},
};
use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::{Span, Spanned},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    Label(&'static str),
    /// A container still open when the input ran out.
    Unclosed { open: Span, closer: char },
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = Result<O, ErrMode<ContextError<Context>>>;

fn punct<'src>(input: &mut Input<'src>, expected: Token<'static>, label: &'static str) -> IResult<Span> {
    any.verify(|t: &PositionedToken<'_>| t.token == expected)
        .map(|t: &PositionedToken<'_>| t.span)
        .context(Context::Label(label))
        .parse_next(input)
}

/// Marks `error` with the container opened at `open` if the input ran out.
fn at_eof(
    input: &Input<'_>,
    error: ErrMode<ContextError<Context>>,
    open: Span,
    closer: char,
) -> ErrMode<ContextError<Context>> {
    if input.eof_offset() == 0 {
        error.map(|e| e.add_context(input, &input.checkpoint(), Context::Unclosed { open, closer }))
    } else {
        error
    }
}

fn primitive<'src>(input: &mut Input<'src>) -> IResult<Spanned<Value>> {
    any.verify_map(|t: &PositionedToken<'_>| {
        let value = match &t.token {
            Token::String(s) => Value::String(s.clone()),
            Token::Number(n) => Value::Number((*n).to_string()),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
            _ => return None,
        };
        Some(Spanned::new(value, t.span))
    })
    .context(Context::Label("value"))
    .parse_next(input)
}

fn value<'src>(input: &mut Input<'src>) -> IResult<Spanned<Value>> {
    let next = peek(any).context(Context::Label("value")).parse_next(input)?;
    match next.token {
        Token::LeftBrace => object(input),
        Token::LeftBracket => array(input),
        _ => primitive(input),
    }
}

/// `string ':' value`
fn member<'src>(input: &mut Input<'src>) -> IResult<Member> {
    let key = any
        .verify_map(|t: &PositionedToken<'_>| match &t.token {
            Token::String(s) => Some(Spanned::new(s.clone(), t.span)),
            _ => None,
        })
        .context(Context::Label("string key"))
        .parse_next(input)?;
    cut_err(|i: &mut Input<'src>| punct(i, Token::Colon, "`:`")).parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;
    Ok(Member { key, value })
}

/// Reads `,` or the closing token; `Some(span)` once the container closes.
fn separator_or_close<'src>(
    input: &mut Input<'src>,
    closer: Token<'static>,
    label: &'static str,
) -> IResult<Option<Span>> {
    cut_err(
        any.verify_map(|t: &PositionedToken<'_>| match &t.token {
            Token::Comma => Some(None),
            token if *token == closer => Some(Some(t.span)),
            _ => None,
        })
        .context(Context::Label(label)),
    )
    .parse_next(input)
}

fn object_body<'src>(input: &mut Input<'src>) -> IResult<(Vec<Member>, Span)> {
    let mut members = Vec::new();
    if let Some(close) =
        opt(|i: &mut Input<'src>| punct(i, Token::RightBrace, "`}`")).parse_next(input)?
    {
        return Ok((members, close));
    }
    loop {
        members.push(cut_err(member).parse_next(input)?);
        if let Some(close) = separator_or_close(input, Token::RightBrace, "`,` or `}`")? {
            return Ok((members, close));
        }
    }
}

fn object<'src>(input: &mut Input<'src>) -> IResult<Spanned<Value>> {
    let open = punct(input, Token::LeftBrace, "`{`")?;
    match object_body(input) {
        Ok((members, close)) => Ok(Spanned::new(Value::Object(members), open.union(close))),
        Err(error) => Err(at_eof(input, error, open, '}')),
    }
}

fn array_body<'src>(input: &mut Input<'src>) -> IResult<(Vec<Spanned<Value>>, Span)> {
    let mut elements = Vec::new();
    if let Some(close) =
        opt(|i: &mut Input<'src>| punct(i, Token::RightBracket, "`]`")).parse_next(input)?
    {
        return Ok((elements, close));
    }
    loop {
        elements.push(cut_err(value).parse_next(input)?);
        if let Some(close) = separator_or_close(input, Token::RightBracket, "`,` or `]`")? {
            return Ok((elements, close));
        }
    }
}

fn array<'src>(input: &mut Input<'src>) -> IResult<Spanned<Value>> {
    let open = punct(input, Token::LeftBracket, "`[`")?;
    match array_body(input) {
        Ok((elements, close)) => Ok(Spanned::new(Value::Array(elements), open.union(close))),
        Err(error) => Err(at_eof(input, error, open, ']')),
    }
}

fn document<'src>(input: &mut Input<'src>) -> IResult<Document> {
    let root = value.parse_next(input)?;
    cut_err(eof.context(Context::Label("end of input"))).parse_next(input)?;
    Ok(Document { root })
}

fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let contexts: Vec<Context> = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().cloned().collect(),
        ErrMode::Incomplete(_) => Vec::new(),
    };

    // Contexts are pushed innermost first; report the outermost open container.
    let unclosed = contexts.iter().rev().find_map(|c| match c {
        Context::Unclosed { open, closer } => Some((*open, *closer)),
        Context::Label(_) => None,
    });
    if let Some((open, closer)) = unclosed {
        let end = tokens.last().map_or(open.end(), |t| t.span.end());
        let what = if closer == '}' { "object" } else { "array" };
        return Diagnostic::error(format!("unterminated {what}"))
            .with_code(ErrorCode::E102)
            .with_label(open, format!("this `{}` is never closed", if closer == '}' { '{' } else { '[' }))
            .with_related_label(Span::new(end.saturating_sub(1)..end), "input ends here")
            .with_help(format!("add the missing `{closer}`"));
    }

    let expected = contexts.iter().rev().find_map(|c| match c {
        Context::Label(label) => Some(*label),
        Context::Unclosed { .. } => None,
    });
    let index = tokens.len() - current_remaining;
    match tokens.get(index) {
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
            let end = tokens.last().map_or(0, |t| t.span.end());
            let message = match expected {
                Some(expected) => format!("unexpected end of input, expected {expected}"),
                None => "unexpected end of input".to_string(),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E101)
                .with_label(Span::new(end.saturating_sub(1)..end), "input ends here")
        }
    }
}

/// Parses JSON text into a [`Document`].
///
/// # Errors
///
/// Returns the lexical errors, an `E104` error for containers nested more
/// than [`MAX_NESTING`](crate::lexer::MAX_NESTING) deep, or the first syntax error.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let tokens: Vec<_> = lexer::tokenize(source)?
        .into_iter()
        .filter(|t| t.token != Token::Whitespace)
        .collect();
    crate::lexer::check_nesting(&tokens, |t| {
        let change = match t.token {
            Token::LeftBrace | Token::LeftBracket => 1,
            Token::RightBrace | Token::RightBracket => -1,
            _ => 0,
        };
        (change, t.span)
    })?;

    let mut input = TokenSlice::new(&tokens);
    document
        .parse_next(&mut input)
        .map_err(|e| ParseError::new(vec![convert_error(e, &tokens, input.eof_offset())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Document {
        match parse(source) {
            Ok(document) => document,
            Err(err) => panic!("failed to parse {source:?}: {err}"),
        }
    }

    fn error(source: &str) -> Diagnostic {
        parse(source).unwrap_err().diagnostics()[0].clone()
    }

    #[test]
    fn test_nested_document() {
        let document = parse_ok(r#"{"name": "trazo", "tags": ["a", "b"], "meta": {"stars": 5}}"#);
        let Value::Object(members) = document.root.inner() else {
            panic!("expected object");
        };
        let keys: Vec<_> = members.iter().map(|m| m.key.inner().as_str()).collect();
        assert_eq!(keys, ["name", "tags", "meta"]);
        assert_eq!(
            *members[1].value,
            Value::Array(vec![
                Spanned::new(Value::String("a".to_string()), Span::default()),
                Spanned::new(Value::String("b".to_string()), Span::default()),
            ])
        );
    }

    #[test]
    fn test_primitive_root() {
        assert_eq!(*parse_ok(" 42 ").root, Value::Number("42".to_string()));
        assert_eq!(*parse_ok("null").root, Value::Null);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(*parse_ok("{}").root, Value::Object(Vec::new()));
        assert_eq!(*parse_ok("[ ]").root, Value::Array(Vec::new()));
    }

    #[test]
    fn test_duplicate_keys_are_kept_for_lowering() {
        let document = parse_ok(r#"{"a": 1, "a": 2}"#);
        let Value::Object(members) = document.root.inner() else {
            panic!("expected object");
        };
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_unterminated_container_reports_outermost_opener() {
        let source = "[\n  1,\n  {\"a\": 1,\n   \"b\": 2\n";
        let diag = error(source);
        assert_eq!(diag.code(), Some(ErrorCode::E102));
        assert_eq!(diag.primary_span(), Some(Span::new(0..1)));

        let diag = error("{\"a\": {\"b\": 1}");
        assert_eq!(diag.code(), Some(ErrorCode::E102));
        assert_eq!(diag.primary_span(), Some(Span::new(0..1)));
    }

    #[test]
    fn test_unterminated_object_line() {
        let source = "\n\n{\"a\": 1,\n \"b\": 2\n";
        let diag = error(source);
        assert_eq!(diag.code(), Some(ErrorCode::E102));
        assert_eq!(diag.primary_span().unwrap().position(source).line, 3);
    }

    #[test]
    fn test_trailing_comma() {
        let diag = error("[1, 2,]");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.primary_span(), Some(Span::new(6..7)));
    }

    #[test]
    fn test_missing_colon() {
        let diag = error(r#"{"a" 1}"#);
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("`:`"));
    }

    #[test]
    fn test_non_string_key() {
        let diag = error("{1: 2}");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("string key"));
    }

    #[test]
    fn test_trailing_content() {
        let diag = error("{} []");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("end of input"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(error("   ").code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_nesting_limit() {
        let depth = crate::lexer::MAX_NESTING;
        let at_limit = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse(&at_limit).is_ok());

        let deep = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        let diag = error(&deep);
        assert_eq!(diag.code(), Some(ErrorCode::E104));
        assert_eq!(diag.primary_span(), Some(Span::new(depth..depth + 1)));

        let objects = format!("{}1{}", "{\"a\": ".repeat(10_000), "}".repeat(10_000));
        assert_eq!(error(&objects).code(), Some(ErrorCode::E104));
    }

    #[test]
    fn test_lexical_errors_win() {
        assert_eq!(error("[01]").code(), Some(ErrorCode::E005));
    }
}
