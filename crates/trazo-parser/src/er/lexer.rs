//! Lexical analyzer for the entity-relationship notation.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, preceded, repeat, terminated},
    stream::Location,
    token::{any, literal, none_of, take_while},
};

use super::{
    ast::Cardinality,
    tokens::{PositionedToken, Token},
};
use crate::{
    error::{ErrorCode, ParseError},
    lexer::{IResult, Input, LexerDiagnostic, cut_error, tokenize_with, word_boundary},
    span::Span,
};

fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    match any.parse_next(input)? {
        'n' => Ok('\n'),
        't' => Ok('\t'),
        c @ ('\\' | '"') => Ok(c),
        _ => Err(cut_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E003,
                message: "invalid escape sequence",
                help: Some("valid escapes: `\\n`, `\\t`, `\\\\`, `\\\"`"),
                start: escape_start,
            },
        )),
    }
}

/// Double-quoted names and attribute values.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();
    '"'.parse_next(input)?;

    let string_char = none_of(['"', '\\', '\n', '\r']);
    let content = repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, c| {
        acc.push(c);
        acc
    });

    cut_err(terminated(content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("close the string on the same line"),
            start: start_pos,
        })
        .map(Token::StringLiteral)
        .parse_next(input)
}

fn cardinality_symbol(input: &mut Input<'_>) -> IResult<Cardinality> {
    alt((
        literal("||"),
        literal("|o"),
        literal("o|"),
        literal("}o"),
        literal("o{"),
        literal("}|"),
        literal("|{"),
        literal("1"),
        literal("?"),
        literal("*"),
        literal("+"),
    ))
    .verify_map(Cardinality::from_symbol)
    .parse_next(input)
}

/// `CARD--CARD`, written without spaces.
fn relation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (cardinality_symbol, "--", cardinality_symbol)
        .with_taken()
        .map(|((left, _, right), text)| Token::Relation { left, right, text })
        .parse_next(input)
}

/// `#` anywhere, or `--` not preceded by a cardinality.
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded(alt(("#", "--")), take_while(0.., |c| c != '\n'))
        .map(Token::Comment)
        .parse_next(input)
}

fn number<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(digit1, word_boundary)
        .map(Token::Number)
        .parse_next(input)
}

/// Identifiers may start with a digit, unlike in the infrastructure notation.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_')
        .map(Token::Identifier)
        .parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
        '.'.value(Token::Dot),
        '*'.value(Token::Star),
        '+'.value(Token::Plus),
    ))
    .parse_next(input)
}

fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., [' ', '\t', '\r'])
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        relation, // Before comments, numbers and punctuation
        line_comment,
        string_literal,
        number,
        identifier,
        punctuation,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Tokenizes entity-relationship source, collecting every lexical error.
pub fn tokenize(source: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    tokenize_with(source, positioned_token)
}

/// Tokens that carry no meaning for the parser.
pub(super) fn is_trivia(token: &Token<'_>) -> bool {
    matches!(token, Token::Whitespace | Token::Comment(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !is_trivia(t))
            .collect()
    }

    #[test]
    fn test_table_header() {
        assert_eq!(
            significant(r##"[users] {bgcolor: "#d0e0d0"}"##),
            vec![
                Token::LeftBracket,
                Token::Identifier("users"),
                Token::RightBracket,
                Token::LeftBrace,
                Token::Identifier("bgcolor"),
                Token::Colon,
                Token::StringLiteral("#d0e0d0".to_string()),
                Token::RightBrace,
            ]
        );
    }

    #[test]
    fn test_column_markers() {
        assert_eq!(
            significant("*+user_id: varchar(255)"),
            vec![
                Token::Star,
                Token::Plus,
                Token::Identifier("user_id"),
                Token::Colon,
                Token::Identifier("varchar"),
                Token::LeftParen,
                Token::Number("255"),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_relation_operators() {
        let tokens = significant("users ||--o{ posts\nusers 1--* posts\n");
        let relations: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Relation { left, right, text } => Some((*left, *right, *text)),
                _ => None,
            })
            .collect();
        assert_eq!(
            relations,
            vec![
                (Cardinality::ExactlyOne, Cardinality::ZeroOrMany, "||--o{"),
                (Cardinality::ExactlyOne, Cardinality::ZeroOrMany, "1--*"),
            ]
        );
    }

    #[test]
    fn test_identifier_starting_with_o_is_not_a_cardinality() {
        assert_eq!(
            significant("orders }|--|| owners"),
            vec![
                Token::Identifier("orders"),
                Token::Relation {
                    left: Cardinality::OneOrMany,
                    right: Cardinality::ExactlyOne,
                    text: "}|--||",
                },
                Token::Identifier("owners"),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            significant("# a table\n-- another comment\n[t] # trailing"),
            vec![
                Token::Newline,
                Token::Newline,
                Token::LeftBracket,
                Token::Identifier("t"),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("[t] {label: \"oops\n").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("[t] @").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E002));
    }
}
