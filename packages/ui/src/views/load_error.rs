use dioxus::prelude::*;

/// A failed load with a button that runs it again.
#[component]
pub fn LoadError(message: String, on_retry: EventHandler<()>) -> Element {
    rsx! {
        div {
            class: "load-error",
            p { class: "view-error", "{message}" }
            button {
                class: "btn btn-secondary",
                onclick: move |_| on_retry.call(()),
                "Try again"
            }
        }
    }
}
