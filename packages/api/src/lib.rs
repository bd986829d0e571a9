//! # API crate: client-side blog logic
//!
//! Everything the screens call lives here, written against the backend traits of the
//! `store` crate so it runs unchanged on the hosted service or the in-memory backend.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`session`] | Signed-in user, change notifications, signup/login/logout, password and profile edits |
//! | [`posts`] | Post validation and CRUD, newest-first listings, home feed with author emails |
//! | [`users`] | Profile lookups for author pages |
//! | [`error`] | Validation, auth and store error kinds and the messages screens show for them |
//! | [`load`] | `Idle`/`Loading`/`Loaded`/`Errored` state each screen keeps for its fetch |
//! | [`lifetime`] | Cancellation token that discards fetch results after a screen unmounts |

pub mod error;
pub mod lifetime;
pub mod load;
pub mod posts;
pub mod session;
pub mod users;

pub use error::{AuthError, PostError, StoreError, ValidationError};
pub use lifetime::CancellationToken;
pub use load::LoadState;
pub use posts::{validate, FeedEntry, PostRepository};
pub use session::{SessionProvider, Subscription};
pub use users::UserDirectory;

pub use store::{Post, PostId, User, UserId};
