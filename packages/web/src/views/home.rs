use dioxus::prelude::*;
use ui::views::HomeView;

use crate::Route;

#[component]
pub fn Home() -> Element {
    let nav = use_navigator();

    rsx! {
        HomeView {
            on_author: move |id: api::UserId| {
                nav.push(Route::Author { id: id.to_string() });
            },
            on_login: move |_| {
                nav.push(Route::Login {});
            },
            on_signup: move |_| {
                nav.push(Route::Signup {});
            },
            on_logout: move |_| {
                nav.push(Route::Login {});
            },
        }
    }
}
