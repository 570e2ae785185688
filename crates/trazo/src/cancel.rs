//! Cooperative cancellation of a running compilation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared flag checked between pipeline stages and inside layout loops.
///
/// Clones observe the same flag, so a caller keeps one clone and hands
/// another to [`Compiler::compile_with_cancel`](crate::Compiler::compile_with_cancel).
///
/// # Examples
///
/// ```
/// # use trazo::CancellationToken;
/// let token = CancellationToken::new();
/// let observer = token.clone();
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
