//! Accumulates the diagnostics of one phase so it can report every problem at once.

use crate::error::{Diagnostic, ParseError};

/// Diagnostics gathered while a phase keeps going past its first problem.
///
/// Lexing resynchronizes on the next character, the ER parser moves on to
/// the next line and the lowerers skip the offending item, so a single run
/// can surface several independent errors.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Yields `value` when nothing was emitted, otherwise every diagnostic in emission order.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] holding all collected diagnostics.
    pub fn finish<T>(self, value: T) -> Result<T, ParseError> {
        if self.diagnostics.is_empty() {
            Ok(value)
        } else {
            Err(ParseError::new(self.diagnostics))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_empty_collector_yields_value() {
        let collector = DiagnosticCollector::new();
        assert_eq!(collector.finish(7).unwrap(), 7);
    }

    #[test]
    fn test_emitted_diagnostics_are_kept_in_order() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(
            Diagnostic::error("undefined table `accounts`")
                .with_code(ErrorCode::E200)
                .with_label(Span::new(30..38), "not defined"),
        );
        collector.emit(
            Diagnostic::error("table `users` is defined multiple times")
                .with_code(ErrorCode::E201)
                .with_label(Span::new(10..17), "duplicate definition"),
        );

        let err = collector.finish(()).unwrap_err();
        let codes: Vec<_> = err.diagnostics().iter().map(Diagnostic::code).collect();
        assert_eq!(codes, vec![Some(ErrorCode::E200), Some(ErrorCode::E201)]);
    }
}
