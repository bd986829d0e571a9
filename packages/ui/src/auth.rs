//! Authentication context and hooks for the UI.

use std::cell::RefCell;
use std::rc::Rc;

use api::{CancellationToken, User};
use dioxus::prelude::*;

use crate::backend::use_services;

/// Authentication state for the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
}

/// Get the current authentication state.
/// Returns a signal that updates when the user logs in or out.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// Provider component that mirrors the session into a signal.
/// Must sit below [`ServicesProvider`](crate::ServicesProvider).
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let services = use_services();
    let auth_state = use_signal(|| AuthState {
        user: services.session.current_user(),
    });

    // The listener fires right away with the value the signal already holds,
    // so only write when it differs.
    let subscription = use_hook(|| {
        let sub = services.session.on_change(move |user| {
            let mut state = auth_state;
            if state.peek().user.as_ref() != user {
                state.set(AuthState {
                    user: user.cloned(),
                });
            }
        });
        Rc::new(RefCell::new(Some(sub)))
    });
    use_drop(move || {
        subscription.borrow_mut().take();
    });

    use_context_provider(|| auth_state);

    rsx! {
        {children}
    }
}

/// A token cancelled when the calling component unmounts.
pub fn use_cancellation() -> CancellationToken {
    let token = use_hook(CancellationToken::new);
    let on_drop = token.clone();
    use_drop(move || on_drop.cancel());
    token
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
    /// Called once the session has been cleared.
    on_logout: EventHandler<()>,
) -> Element {
    let services = use_services();

    let onclick = move |_| {
        let session = services.session.clone();
        async move {
            session.sign_out().await;
            on_logout.call(());
        }
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
