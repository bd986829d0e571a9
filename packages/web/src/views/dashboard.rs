use dioxus::prelude::*;
use ui::views::DashboardView;

use crate::Route;

#[component]
pub fn Dashboard() -> Element {
    let nav = use_navigator();

    rsx! {
        DashboardView {
            on_login: move |_| {
                nav.replace(Route::Login {});
            },
            on_edit: move |id: api::PostId| {
                nav.push(Route::EditBlog { id: id.to_string() });
            },
        }
    }
}
