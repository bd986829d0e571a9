use dioxus::prelude::*;

/// Shown for any path the router does not know.
#[component]
pub fn NotFoundView(
    /// The unmatched path, for display.
    path: String,
    on_home: EventHandler<()>,
) -> Element {
    rsx! {
        div {
            class: "view-page",
            h1 { class: "view-title", "Page not found" }
            p { class: "view-muted", "Nothing lives at /{path}." }
            button {
                class: "btn btn-link",
                onclick: move |_| on_home.call(()),
                "Back to home"
            }
        }
    }
}
