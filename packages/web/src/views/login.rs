use dioxus::prelude::*;
use ui::views::LoginView;

use crate::Route;

#[component]
pub fn Login() -> Element {
    let nav = use_navigator();

    rsx! {
        LoginView {
            on_success: move |_| {
                nav.push(Route::Dashboard {});
            },
            on_signup: move |_| {
                nav.push(Route::Signup {});
            },
        }
    }
}
