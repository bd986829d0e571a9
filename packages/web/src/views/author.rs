use dioxus::prelude::*;
use ui::views::AuthorView;

#[component]
pub fn Author(id: String) -> Element {
    rsx! {
        AuthorView { author_id: id }
    }
}
