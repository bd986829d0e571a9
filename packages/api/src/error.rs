//! Error taxonomy shared by every screen.
//!
//! - [`ValidationError`]: caught before anything is sent, shown verbatim.
//! - [`AuthError`]: auth failures, shown with the collaborator's own message.
//! - [`StoreError`]: document store failures, shown as a generic retry message;
//!   the underlying [`BackendError`] is kept as the source and logged.
//! - [`PostError`]: what post mutations return: validation or store.

use store::BackendError;

/// Title or body length outside the accepted range.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Title must be 5-50 characters and body 100-3000 characters.")]
pub struct ValidationError {
    pub title_chars: usize,
    pub body_chars: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("You need to be logged in to do that.")]
    NotAuthenticated,

    /// Rejected by the auth service or the profile store.
    #[error("{0}")]
    Rejected(String),

    /// Caught client-side before contacting the service.
    #[error("{0}")]
    Invalid(String),
}

impl From<BackendError> for AuthError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotSignedIn => AuthError::NotAuthenticated,
            other => AuthError::Rejected(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Something went wrong. Please try again later.")]
    Backend(#[source] BackendError),

    #[error("Post not found.")]
    NotFound,
}

impl From<BackendError> for StoreError {
    fn from(e: BackendError) -> Self {
        tracing::error!("document store request failed: {e}");
        StoreError::Backend(e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PostError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BackendError> for PostError {
    fn from(e: BackendError) -> Self {
        PostError::Store(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_hides_backend_detail() {
        let err = StoreError::from(BackendError::Status {
            status: 401,
            message: "Permission denied".to_string(),
        });
        assert_eq!(err.to_string(), "Something went wrong. Please try again later.");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("backend returned 401: Permission denied"));
    }

    #[test]
    fn test_auth_error_keeps_collaborator_message() {
        let err = AuthError::from(BackendError::auth("EMAIL_EXISTS", "already in use"));
        assert_eq!(err, AuthError::Rejected("already in use".to_string()));
        assert_eq!(AuthError::from(BackendError::NotSignedIn), AuthError::NotAuthenticated);
    }

    #[test]
    fn test_post_error_is_transparent() {
        let err = PostError::from(ValidationError {
            title_chars: 2,
            body_chars: 10,
        });
        assert_eq!(
            err.to_string(),
            "Title must be 5-50 characters and body 100-3000 characters."
        );
    }
}
