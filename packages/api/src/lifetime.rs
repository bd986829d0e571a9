//! Screen lifetime tokens.
//!
//! A screen creates a [`CancellationToken`] when it mounts and cancels it when it
//! unmounts. Fetches started by the screen run through [`guard`](CancellationToken::guard),
//! which drops their result if the screen went away while they were in flight.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Run `fut` and return its output, or `None` if the token was cancelled
    /// before it started or while it was running.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        let output = fut.await;
        if self.is_cancelled() {
            tracing::debug!("discarding result of a cancelled fetch");
            return None;
        }
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_through() {
        let token = CancellationToken::new();
        assert_eq!(token.guard(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_discards() {
        let token = CancellationToken::new();
        let screen = token.clone();
        let result = token
            .guard(async move {
                screen.cancel();
                7
            })
            .await;
        assert_eq!(result, None);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_fetch() {
        let token = CancellationToken::new();
        token.cancel();
        let ran = Cell::new(false);
        let result = token.guard(async { ran.set(true) }).await;
        assert!(result.is_none());
        assert!(!ran.get());
    }
}
