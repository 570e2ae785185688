//! Lexical analyzer for RFC 8259 JSON.

use winnow::{
    Parser as _,
    ascii::{digit0, digit1},
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{AsChar, Location, Stream},
    token::{any, none_of, one_of, take_while},
};

use super::tokens::{PositionedToken, Token};
use crate::{
    error::{ErrorCode, ParseError},
    lexer::{IResult, Input, LexerDiagnostic, cut_error, tokenize_with},
    span::Span,
};

fn invalid_unicode(input: &Input<'_>, start: usize) -> ErrMode<ContextError<LexerDiagnostic>> {
    cut_error(
        input,
        LexerDiagnostic {
            code: ErrorCode::E004,
            message: "invalid unicode escape",
            help: Some("use `\\u` and four hex digits; surrogates must form a high-low pair"),
            start,
        },
    )
}

fn hex4(input: &mut Input<'_>) -> IResult<u32> {
    take_while(4, AsChar::is_hex_digit)
        .try_map(|digits: &str| u32::from_str_radix(digits, 16))
        .parse_next(input)
}

/// The part of a `\u` escape after the `u`, joining surrogate pairs.
fn unicode_escape(input: &mut Input<'_>, start: usize) -> IResult<char> {
    let Ok(high) = hex4.parse_next(input) else {
        return Err(invalid_unicode(input, start));
    };
    let code = match high {
        0xD800..=0xDBFF => {
            let Ok(low) = preceded("\\u", hex4).parse_next(input) else {
                return Err(invalid_unicode(input, start));
            };
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(invalid_unicode(input, start));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        }
        0xDC00..=0xDFFF => return Err(invalid_unicode(input, start)),
        scalar => scalar,
    };
    char::from_u32(code).ok_or_else(|| invalid_unicode(input, start))
}

fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    match any.parse_next(input)? {
        c @ ('"' | '\\' | '/') => Ok(c),
        'b' => Ok('\u{8}'),
        'f' => Ok('\u{c}'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        't' => Ok('\t'),
        'u' => unicode_escape(input, escape_start),
        _ => Err(cut_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E003,
                message: "invalid escape sequence",
                help: Some("valid escapes: `\\\"`, `\\\\`, `\\/`, `\\b`, `\\f`, `\\n`, `\\r`, `\\t`, `\\uXXXX`"),
                start: escape_start,
            },
        )),
    }
}

/// Control characters that must be escaped inside a string. Raw line breaks end it as unterminated.
fn is_raw_control(c: char) -> bool {
    c < '\u{20}' && c != '\n' && c != '\r'
}

fn string<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();
    '"'.parse_next(input)?;

    let string_char = none_of(['"', '\\', '\n', '\r']);
    let content = repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, c| {
        acc.push(c);
        acc
    });

    let (text, raw) = cut_err(terminated(content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string",
            help: Some("close the string with `\"` before the end of the line"),
            start: start_pos,
        })
        .with_taken()
        .parse_next(input)?;

    // The whole string is consumed first so lexing resumes after it.
    if let Some(offset) = raw.find(is_raw_control) {
        return Err(cut_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E002,
                message: "unescaped control character in string",
                help: Some("write control characters as escapes such as `\\t` or `\\u0001`"),
                start: start_pos + 1 + offset,
            },
        ));
    }
    Ok(Token::String(text))
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')
}

/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
fn number<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    peek(one_of(|c: char| c == '-' || c.is_ascii_digit())).parse_next(input)?;

    let checkpoint = input.checkpoint();
    let grammar = (
        opt('-'),
        alt(("0", (one_of('1'..='9'), digit0).take())),
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    );
    match terminated(grammar.take(), peek(not(one_of(is_number_char)))).parse_next(input) {
        Ok(text) => Ok(Token::Number(text)),
        Err(ErrMode::Backtrack(_)) => {
            input.reset(&checkpoint);
            take_while(1.., is_number_char).parse_next(input)?;
            Err(cut_error(
                input,
                LexerDiagnostic {
                    code: ErrorCode::E005,
                    message: "malformed number",
                    help: Some("numbers look like `-12`, `0.5` or `6.02e23`, without leading zeros"),
                    start,
                },
            ))
        }
        Err(err) => Err(err),
    }
}

/// `true`, `false` and `null`; any other bare word is an error.
fn word<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    let word = take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)?;
    match word {
        "true" => Ok(Token::True),
        "false" => Ok(Token::False),
        "null" => Ok(Token::Null),
        _ => Err(cut_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E002,
                message: "unexpected word",
                help: Some("literals are `true`, `false` and `null`; strings need double quotes"),
                start,
            },
        )),
    }
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., [' ', '\t', '\r', '\n'])
        .value(Token::Whitespace)
        .parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();
    let token = alt((string, number, word, punctuation, whitespace)).parse_next(input)?;
    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Tokenizes JSON text, collecting every lexical error.
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
            .filter(|t| *t != Token::Whitespace)
            .collect()
    }

    fn first_code(source: &str) -> Option<ErrorCode> {
        tokenize(source).unwrap_err().diagnostics()[0].code()
    }

    #[test]
    fn test_object_tokens() {
        assert_eq!(
            significant(r#"{"a": [1, true, null]}"#),
            vec![
                Token::LeftBrace,
                Token::String("a".to_string()),
                Token::Colon,
                Token::LeftBracket,
                Token::Number("1"),
                Token::Comma,
                Token::True,
                Token::Comma,
                Token::Null,
                Token::RightBracket,
                Token::RightBrace,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            significant("0 -12 3.25 6.02e23 1E-9"),
            vec![
                Token::Number("0"),
                Token::Number("-12"),
                Token::Number("3.25"),
                Token::Number("6.02e23"),
                Token::Number("1E-9"),
            ]
        );
    }

    #[test]
    fn test_malformed_numbers() {
        for source in ["01", "1.", "-", "1e", "1.2.3", "+1", "2x"] {
            let code = tokenize(source)
                .err()
                .and_then(|e| e.diagnostics()[0].code());
            assert!(
                matches!(code, Some(ErrorCode::E005 | ErrorCode::E002)),
                "{source:?} gave {code:?}"
            );
        }
        assert_eq!(first_code("01"), Some(ErrorCode::E005));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            significant(r#""tab\tquote\"slash\/ é""#),
            vec![Token::String("tab\tquote\"slash/ é".to_string())]
        );
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(
            significant(r#""\ud83d\ude00""#),
            vec![Token::String("😀".to_string())]
        );
    }

    #[test]
    fn test_lone_surrogate_is_rejected() {
        assert_eq!(first_code(r#""\ud83d""#), Some(ErrorCode::E004));
        assert_eq!(first_code(r#""\ude00""#), Some(ErrorCode::E004));
        assert_eq!(first_code(r#""\u12G4""#), Some(ErrorCode::E004));
    }

    #[test]
    fn test_invalid_escape() {
        assert_eq!(first_code(r#""\x41""#), Some(ErrorCode::E003));
    }

    #[test]
    fn test_raw_control_characters_are_rejected() {
        for source in ["\"\u{1}\"", "\"a\tb\"", "[\"x\u{1f}\"]"] {
            let err = tokenize(source).unwrap_err();
            let diag = &err.diagnostics()[0];
            assert_eq!(diag.code(), Some(ErrorCode::E002), "{source:?}");
            assert!(diag.message().contains("control character"));
            assert_eq!(err.diagnostics().len(), 1);
        }
        assert_eq!(
            significant("\"a\\tb\\u0001\""),
            vec![Token::String("a\tb\u{1}".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(first_code("{\"a\n}"), Some(ErrorCode::E001));
    }

    #[test]
    fn test_bare_word_reported_once() {
        let err = tokenize("[undefined]").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E002));
        assert_eq!(err.diagnostics()[0].primary_span(), Some(Span::new(1..10)));
    }
}
