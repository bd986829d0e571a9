use dioxus::prelude::*;

use crate::icons::{FaChevronDown, FaUser};
use crate::Icon;

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// Persistent header: the brand on the left, `children` on the right.
#[component]
pub fn Navbar(
    #[props(default = "Blog App".to_string())] brand: String,
    on_brand: EventHandler<()>,
    children: Element,
) -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        header {
            class: "navbar",
            a {
                class: "navbar-brand",
                href: "/",
                onclick: move |evt: MouseEvent| {
                    evt.prevent_default();
                    on_brand.call(());
                },
                "{brand}"
            }
            nav { class: "navbar-links", {children} }
        }
    }
}

/// Destinations offered by [`UserMenu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Home,
    Dashboard,
    Profile,
}

/// Signed-in user's email with a dropdown of destinations and a logout entry.
#[component]
pub fn UserMenu(
    email: String,
    on_select: EventHandler<MenuTarget>,
    on_logout: EventHandler<()>,
) -> Element {
    let mut open = use_signal(|| false);

    let mut select = move |target: MenuTarget| {
        open.set(false);
        on_select.call(target);
    };

    rsx! {
        div {
            class: "user-menu",
            button {
                class: "user-menu-toggle",
                onclick: move |_| open.toggle(),
                Icon { icon: FaUser, width: 12, height: 12 }
                span { "{email}" }
                Icon { icon: FaChevronDown, width: 10, height: 10 }
            }
            if open() {
                ul {
                    class: "user-menu-items",
                    li { button { onclick: move |_| select(MenuTarget::Home), "Home" } }
                    li { button { onclick: move |_| select(MenuTarget::Dashboard), "Dashboard" } }
                    li { button { onclick: move |_| select(MenuTarget::Profile), "Profile" } }
                    li {
                        button {
                            onclick: move |_| {
                                open.set(false);
                                on_logout.call(());
                            },
                            "Log Out"
                        }
                    }
                }
            }
        }
    }
}
