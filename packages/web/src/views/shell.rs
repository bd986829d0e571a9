//! Persistent layout: header reflecting the session, then the routed page.

use dioxus::prelude::*;
use ui::{use_auth, use_services, MenuTarget, Navbar, UserMenu};

use crate::Route;

#[component]
pub fn Shell() -> Element {
    let nav = use_navigator();
    let auth = use_auth();
    let services = use_services();

    let on_select = move |target: MenuTarget| {
        nav.push(match target {
            MenuTarget::Home => Route::Home {},
            MenuTarget::Dashboard => Route::Dashboard {},
            MenuTarget::Profile => Route::Profile {},
        });
    };

    // Sign out fully before leaving, so the login page sees no session
    let on_logout = move |_: ()| {
        let session = services.session.clone();
        spawn(async move {
            session.sign_out().await;
            nav.push(Route::Login {});
        });
    };

    rsx! {
        Navbar {
            on_brand: move |_| {
                nav.push(Route::Home {});
            },
            if let Some(user) = auth().user {
                UserMenu {
                    email: user.email,
                    on_select: on_select,
                    on_logout: on_logout,
                }
            } else {
                Link { to: Route::Login {}, "Login" }
            }
        }
        main {
            Outlet::<Route> {}
        }
    }
}
