use dioxus::prelude::*;
use ui::views::NotFoundView;

use crate::Route;

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let nav = use_navigator();
    tracing::debug!(path = %segments.join("/"), "no route matched");

    rsx! {
        NotFoundView {
            path: segments.join("/"),
            on_home: move |_| {
                nav.push(Route::Home {});
            },
        }
    }
}
