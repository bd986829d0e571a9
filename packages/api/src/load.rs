//! Per-screen loading state.
//!
//! ```text
//! Idle --start--> Loading --finish(Ok)--> Loaded(T)
//!                        \--finish(Err)-> Errored(message)
//! ```
//!
//! `start` may be called from any state (a retry). A `finish` that arrives
//! when no fetch is in flight is ignored.

use std::fmt::Display;

#[derive(Clone, Debug, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Errored(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    pub fn start(&mut self) {
        *self = LoadState::Loading;
    }

    /// Record the outcome of the in-flight fetch. Returns whether it was applied.
    pub fn finish<E: Display>(&mut self, result: Result<T, E>) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Errored(e.to_string()),
        };
        true
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Errored(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_success() {
        let mut state = LoadState::default();
        assert_eq!(state, LoadState::Idle);
        state.start();
        assert!(state.is_loading());
        assert!(state.finish(Ok::<_, String>(vec![1, 2])));
        assert_eq!(state.value(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_load_failure_keeps_message() {
        let mut state: LoadState<u32> = LoadState::default();
        state.start();
        state.finish(Err("Something went wrong. Please try again later."));
        assert_eq!(
            state.error(),
            Some("Something went wrong. Please try again later.")
        );
        assert!(state.value().is_none());
    }

    #[test]
    fn test_finish_without_fetch_is_ignored() {
        let mut state: LoadState<u32> = LoadState::default();
        assert!(!state.finish(Ok::<_, String>(1)));
        assert_eq!(state, LoadState::Idle);

        state.start();
        state.finish(Ok::<_, String>(1));
        assert!(!state.finish(Ok::<_, String>(2)));
        assert_eq!(state.value(), Some(&1));
    }

    #[test]
    fn test_retry_after_error() {
        let mut state: LoadState<u32> = LoadState::default();
        state.start();
        state.finish(Err("offline"));
        state.start();
        assert!(state.error().is_none());
        state.finish(Ok::<_, String>(3));
        assert_eq!(state.value(), Some(&3));
    }

    #[tokio::test]
    async fn test_retry_refetches_once_store_recovers() {
        let backend = store::MemoryBackend::new();
        let posts = crate::PostRepository::new(backend.clone());
        let mut state = LoadState::default();

        backend.set_store_offline(true);
        state.start();
        state.finish(posts.list_all().await);
        assert_eq!(
            state.error(),
            Some("Something went wrong. Please try again later.")
        );

        backend.set_store_offline(false);
        state.start();
        assert!(state.finish(posts.list_all().await));
        assert_eq!(state.value().map(Vec::len), Some(0));
    }
}
