//! Lexical analyzer for the infrastructure notation.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, opt, preceded, repeat, terminated},
    stream::Location,
    token::{any, literal, none_of, one_of, take_while},
};

use super::tokens::{PositionedToken, Token};
use crate::{
    error::{ErrorCode, ParseError},
    lexer::{IResult, Input, LexerDiagnostic, cut_error, tokenize_with, word_boundary},
    span::Span,
};

/// Parse a backslash escape inside a string literal.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    match any.parse_next(input)? {
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        't' => Ok('\t'),
        '0' => Ok('\0'),
        c @ ('\\' | '\'' | '"') => Ok(c),
        _ => Err(cut_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E003,
                message: "invalid escape sequence",
                help: Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\0`, `\\\\`, `\\'`, `\\\"`"),
                start: escape_start,
            },
        )),
    }
}

/// Parse a single- or double-quoted string on one line.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();
    let quote = one_of(['"', '\'']).parse_next(input)?;

    let string_char = none_of(move |c: char| c == quote || c == '\\' || c == '\n' || c == '\r');
    let content = repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, c| {
        acc.push(c);
        acc
    });

    cut_err(terminated(content, quote))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("close the string on the same line"),
            start: start_pos,
        })
        .map(Token::StringLiteral)
        .parse_next(input)
}

/// Parse an unsigned decimal number such as `8080` or `0.5`.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated((digit1, opt(('.', digit1))).take(), word_boundary)
        .try_map(str::parse::<f64>)
        .map(Token::NumberLiteral)
        .parse_next(input)
}

/// Parse `#` comment up to the end of the line
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded('#', take_while(0.., |c| c != '\n'))
        .map(Token::Comment)
        .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((
            literal("from"),
            literal("import"),
            literal("as"),
            literal("with"),
            literal("True"),
            literal("False"),
            literal("None"),
        )),
        word_boundary,
    )
    .map(|keyword: &str| match keyword {
        "from" => Token::From,
        "import" => Token::Import,
        "as" => Token::As,
        "with" => Token::With,
        "True" => Token::True,
        "False" => Token::False,
        _ => Token::None,
    })
    .parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_')
        .verify(|s: &str| s.chars().next().is_some_and(|c| !c.is_ascii_digit()))
        .map(Token::Identifier)
        .parse_next(input)
}

fn operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal(">>").value(Token::Forward),
        literal("<<").value(Token::Backward),
        '-'.value(Token::Minus),
        '='.value(Token::Equals),
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
        '.'.value(Token::Dot),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
    ))
    .parse_next(input)
}

/// Spaces, tabs and backslash line continuations.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        take_while(1.., [' ', '\t', '\r']).void(),
        ('\\', opt('\r'), '\n').void(),
    ))
    .value(Token::Whitespace)
    .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        number_literal,
        keyword, // Must come before identifier
        identifier,
        operator,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Tokenizes infrastructure source, collecting every lexical error.
pub fn tokenize(source: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    tokenize_with(source, positioned_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !matches!(t, Token::Whitespace))
            .collect()
    }

    #[test]
    fn test_chain_tokens() {
        assert_eq!(
            significant("lb >> web << db - cache"),
            vec![
                Token::Identifier("lb"),
                Token::Forward,
                Token::Identifier("web"),
                Token::Backward,
                Token::Identifier("db"),
                Token::Minus,
                Token::Identifier("cache"),
            ]
        );
    }

    #[test]
    fn test_keywords_respect_word_boundaries() {
        assert_eq!(
            significant("from fromage import imports"),
            vec![
                Token::From,
                Token::Identifier("fromage"),
                Token::Import,
                Token::Identifier("imports"),
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            significant(r#"EC2("web \"1\"") ELB('lb')"#),
            vec![
                Token::Identifier("EC2"),
                Token::LeftParen,
                Token::StringLiteral("web \"1\"".to_string()),
                Token::RightParen,
                Token::Identifier("ELB"),
                Token::LeftParen,
                Token::StringLiteral("lb".to_string()),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            significant("port=8080 ratio=0.5"),
            vec![
                Token::Identifier("port"),
                Token::Equals,
                Token::NumberLiteral(8080.0),
                Token::Identifier("ratio"),
                Token::Equals,
                Token::NumberLiteral(0.5),
            ]
        );
    }

    #[test]
    fn test_comment_and_newline() {
        assert_eq!(
            significant("a # note\nb"),
            vec![
                Token::Identifier("a"),
                Token::Comment(" note"),
                Token::Newline,
                Token::Identifier("b"),
            ]
        );
    }

    #[test]
    fn test_line_continuation_is_whitespace() {
        assert_eq!(
            significant("a >> \\\n  b"),
            vec![Token::Identifier("a"), Token::Forward, Token::Identifier("b")]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("web = EC2").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..3));
        assert_eq!(tokens[2].span, Span::new(4..5));
        assert_eq!(tokens[4].span, Span::new(6..9));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("a = EC2(\"web\nb = 1").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.primary_span().unwrap().start(), 8);
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r#"x = "\q""#).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
    }

    #[test]
    fn test_unexpected_characters_all_reported() {
        let err = tokenize("a $ b ; c").unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert!(
            err.diagnostics()
                .iter()
                .all(|d| d.code() == Some(ErrorCode::E002))
        );
    }
}
