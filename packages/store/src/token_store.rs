//! # Persisted sign-in
//!
//! The hosted auth service hands out a long-lived refresh token. Keeping it (with
//! the account it belongs to) in a [`TokenStore`] lets the next start of the app
//! pick the session back up instead of asking the user to log in again.
//!
//! | Store | Where |
//! |-------|-------|
//! | [`LocalTokenStore`] | browser `localStorage` (wasm only) |
//! | [`FileTokenStore`] | a JSON file, e.g. under `dirs::data_dir()` on desktop |
//! | [`MemoryTokenStore`] | process memory, for tests |

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::models::AuthAccount;

/// What is remembered between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub account: AuthAccount,
    pub refresh_token: String,
}

/// Somewhere to keep the signed-in session across restarts.
///
/// Failures are logged and otherwise ignored: losing the saved session only
/// means logging in again.
pub trait TokenStore: fmt::Debug {
    fn load(&self) -> Option<SavedSession>;

    /// Remember `session`, or forget the saved one when `None`.
    fn save(&self, session: Option<&SavedSession>);
}

/// Token store that lives only as long as the process. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    saved: Arc<Mutex<Option<SavedSession>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out with `session` already saved.
    pub fn with_session(session: SavedSession) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(session))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<SavedSession> {
        self.saved.lock().unwrap().clone()
    }

    fn save(&self, session: Option<&SavedSession>) {
        *self.saved.lock().unwrap() = session.cloned();
    }
}

/// Token store backed by one JSON file.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<SavedSession> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(path = %self.path.display(), "ignoring saved session: {e}"))
            .ok()
    }

    fn save(&self, session: Option<&SavedSession>) {
        let result = match session {
            Some(session) => serde_json::to_string(session)
                .map_err(std::io::Error::other)
                .and_then(|json| {
                    if let Some(parent) = self.path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&self.path, json)
                }),
            None => match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "could not save session: {e}");
        }
    }
}

/// Token store backed by the browser's `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct LocalTokenStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalTokenStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStore for LocalTokenStore {
    fn load(&self) -> Option<SavedSession> {
        let raw = Self::storage()?.get_item(&self.key).ok().flatten()?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!("ignoring saved session: {e}"))
            .ok()
    }

    fn save(&self, session: Option<&SavedSession>) {
        let Some(storage) = Self::storage() else {
            tracing::warn!("localStorage unavailable, session not saved");
            return;
        };
        let result = match session.map(serde_json::to_string) {
            Some(Ok(json)) => storage.set_item(&self.key, &json),
            Some(Err(e)) => {
                tracing::warn!("could not encode session: {e}");
                return;
            }
            None => storage.remove_item(&self.key),
        };
        if result.is_err() {
            tracing::warn!("could not write session to localStorage");
        }
    }
}
