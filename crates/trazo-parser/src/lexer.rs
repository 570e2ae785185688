//! Error-recovering lexer driver shared by every notation.
//!
//! Each notation supplies a winnow parser that reads one positioned token.
//! [`tokenize_with`] runs it to the end of the input, converting failures
//! into [`Diagnostic`]s and skipping a character to resynchronize, so a
//! single pass reports every lexical error in the source.

use winnow::{
    Parser as _,
    combinator::{not, peek},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::one_of,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

pub(crate) type Input<'a> = LocatingSlice<&'a str>;
pub(crate) type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Builds a committed error carrying `diagnostic` at the current position.
pub(crate) fn cut_error(
    input: &Input<'_>,
    diagnostic: LexerDiagnostic,
) -> ErrMode<ContextError<LexerDiagnostic>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), diagnostic))
}

/// Succeeds without consuming if the next character cannot continue an identifier.
pub(crate) fn word_boundary(input: &mut Input<'_>) -> IResult<()> {
    peek(not(one_of(|c: char| c.is_alphanumeric() || c == '_'))).parse_next(input)
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<T> {
    tokens: Vec<T>,
    diagnostics: DiagnosticCollector,
}

impl<T> Lexer<T> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize<'a, F>(&mut self, mut input: Input<'a>, mut token: F)
    where
        F: FnMut(&mut Input<'a>) -> IResult<T>,
    {
        while !input.is_empty() {
            match token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    // Resynchronize on the next character.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<T>, ParseError> {
        self.diagnostics.finish(self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) if no diagnostic context is found.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Deepest bracket nesting accepted by the parsers.
///
/// Parsing, lowering and dropping the syntax tree all recurse once per level.
pub(crate) const MAX_NESTING: usize = 128;

/// Rejects a token stream whose brackets nest deeper than [`MAX_NESTING`].
///
/// `nesting` maps a token to `+1` when it opens a level, `-1` when it closes
/// one and `0` otherwise, together with its span.
///
/// # Errors
///
/// Returns an `E104` diagnostic at the first opener past the limit.
pub(crate) fn check_nesting<T>(
    tokens: &[T],
    nesting: impl Fn(&T) -> (isize, Span),
) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for token in tokens {
        let (change, span) = nesting(token);
        match change {
            1.. => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(Diagnostic::error(format!(
                        "brackets nested more than {MAX_NESTING} levels deep"
                    ))
                    .with_code(ErrorCode::E104)
                    .with_label(span, "too deeply nested")
                    .with_help("flatten the structure")
                    .into());
                }
            }
            ..=-1 => depth = depth.saturating_sub(1),
            0 => {}
        }
    }
    Ok(())
}

/// Tokenizes `source` with the single-token parser `token`, collecting every error.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per lexical error.
pub(crate) fn tokenize_with<'a, T, F>(source: &'a str, token: F) -> Result<Vec<T>, ParseError>
where
    F: FnMut(&mut Input<'a>) -> IResult<T>,
{
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(source), token);
    lexer.finish()
}
