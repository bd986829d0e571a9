//! This crate contains all shared UI for the workspace.

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod backend;
pub use backend::{make_backend, use_services, AppBackend, Services, ServicesProvider};

pub mod markdown;

pub mod views;

mod navbar;
pub use navbar::{MenuTarget, Navbar, UserMenu};

mod auth;
pub use auth::{use_auth, use_cancellation, AuthProvider, AuthState, LogoutButton};

mod post_card;
pub use post_card::{format_date, preview, PostCard, PREVIEW_CHARS};
