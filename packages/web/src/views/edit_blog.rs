use dioxus::prelude::*;
use ui::views::EditPostView;

use crate::Route;

#[component]
pub fn EditBlog(id: String) -> Element {
    let nav = use_navigator();

    rsx! {
        EditPostView {
            post_id: id,
            on_done: move |_| {
                nav.push(Route::Dashboard {});
            },
        }
    }
}
