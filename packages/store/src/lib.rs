pub mod backend;
pub mod config;
pub mod models;
pub mod watch;

mod memory;
pub use memory::MemoryBackend;

mod firebase;
pub use firebase::FirebaseBackend;

mod token_store;
pub use token_store::{FileTokenStore, MemoryTokenStore, SavedSession, TokenStore};
#[cfg(target_arch = "wasm32")]
pub use token_store::LocalTokenStore;

pub use backend::{AuthBackend, BackendError, DocumentStore};
pub use config::{BackendConfig, ConfigError};
pub use models::{AuthAccount, DecodeError, Post, PostId, User, UserId};
pub use watch::{AuthListeners, AuthWatch};
