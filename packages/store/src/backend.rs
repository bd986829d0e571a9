//! # Backend: the hosted auth + document store collaborator
//!
//! Everything the client knows about its backend-as-a-service goes through two
//! async traits, so the same session and post logic works against the hosted
//! service ([`crate::FirebaseBackend`]) or an in-process stand-in
//! ([`crate::MemoryBackend`]).
//!
//! ## [`AuthBackend`]
//!
//! Credential lifecycle: sign up, sign in, sign out, profile display name,
//! password change, and account deletion (used to roll back a half-finished
//! signup). The backend owns the signed-in credential; callers read it back with
//! [`current_account`](AuthBackend::current_account) and follow it with
//! [`on_auth_state_change`](AuthBackend::on_auth_state_change), which reports every
//! sign-in and sign-out, including ones the backend makes on its own (a refresh
//! token that stopped working).
//!
//! ## [`DocumentStore`]
//!
//! A JSON tree addressed by slash-separated paths (`"blogs/-Nabc"`):
//!
//! | Method | Semantics |
//! |--------|-----------|
//! | [`read`](DocumentStore::read) | Value at `path`, `None` when absent. |
//! | [`write`](DocumentStore::write) | Replace the value at `path`. |
//! | [`push`](DocumentStore::push) | Store `value` under a new generated child key of `path`, returning the key. |
//! | [`update`](DocumentStore::update) | Merge the top-level fields of `patch` into the object at `path`. |
//! | [`remove`](DocumentStore::remove) | Delete `path`. Removing an absent path succeeds. |
//! | [`query`](DocumentStore::query) | Children of `path` whose `field` equals `equals`, as `(key, value)` pairs. |

use std::future::Future;

use serde_json::Value;

use crate::models::AuthAccount;
use crate::watch::AuthWatch;

/// Failure reported by the backend collaborator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The auth service rejected the request. `message` is human readable.
    #[error("{message}")]
    Auth { code: String, message: String },

    /// The operation needs a signed-in credential.
    #[error("not signed in")]
    NotSignedIn,

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The backend is not reachable.
    #[error("backend unavailable")]
    Unavailable,
}

impl BackendError {
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Async interface to the hosted auth service.
pub trait AuthBackend {
    /// Account currently signed in, if any.
    fn current_account(&self) -> Option<AuthAccount>;

    /// Call `listener` whenever the signed-in account changes to another account
    /// or to none. Notifications stop when the returned watch is dropped.
    fn on_auth_state_change(&self, listener: impl Fn(Option<&AuthAccount>) + 'static) -> AuthWatch;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthAccount, BackendError>>;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthAccount, BackendError>>;

    fn sign_out(&self) -> impl Future<Output = ()>;

    /// Set the display name of the signed-in account.
    fn update_display_name(&self, name: &str) -> impl Future<Output = Result<(), BackendError>>;

    /// Change the password of the signed-in account.
    fn update_password(&self, password: &str) -> impl Future<Output = Result<(), BackendError>>;

    /// Delete the signed-in account and sign out.
    fn delete_account(&self) -> impl Future<Output = Result<(), BackendError>>;
}

/// Async interface to the hosted JSON document store.
pub trait DocumentStore {
    fn read(&self, path: &str) -> impl Future<Output = Result<Option<Value>, BackendError>>;

    fn write(&self, path: &str, value: Value) -> impl Future<Output = Result<(), BackendError>>;

    fn push(&self, path: &str, value: Value) -> impl Future<Output = Result<String, BackendError>>;

    fn update(&self, path: &str, patch: Value) -> impl Future<Output = Result<(), BackendError>>;

    fn remove(&self, path: &str) -> impl Future<Output = Result<(), BackendError>>;

    fn query(
        &self,
        path: &str,
        field: &str,
        equals: &str,
    ) -> impl Future<Output = Result<Vec<(String, Value)>, BackendError>>;
}

/// Flatten a collection object (`{key: child, ...}`) into `(key, child)` pairs.
///
/// `null` and non-object values yield nothing.
pub fn children(value: Option<Value>) -> Vec<(String, Value)> {
    match value {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_of_collection() {
        let pairs = children(Some(json!({ "a": { "x": 1 }, "b": { "x": 2 } })));
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|(k, v)| k == "b" && v["x"] == 2));
    }

    #[test]
    fn test_children_of_nothing() {
        assert!(children(None).is_empty());
        assert!(children(Some(Value::Null)).is_empty());
        assert!(children(Some(json!("scalar"))).is_empty());
    }

    #[test]
    fn test_auth_error_displays_message() {
        let err = BackendError::auth("EMAIL_EXISTS", "already in use");
        assert_eq!(err.to_string(), "already in use");
    }
}
