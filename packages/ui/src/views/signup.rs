//! Registration page view.

use api::session::{MIN_NAME_CHARS, MIN_PASSWORD_CHARS};
use dioxus::prelude::*;

use crate::use_services;

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// Signup page component.
#[component]
pub fn SignupView(on_success: EventHandler<()>, on_login: EventHandler<()>) -> Element {
    let services = use_services();
    let mut first_name = use_signal(String::new);
    let mut last_name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_signup = move |evt: FormEvent| {
        evt.prevent_default();
        let session = services.session.clone();
        spawn(async move {
            error.set(None);
            loading.set(true);
            match session
                .sign_up(&first_name(), &last_name(), &email(), &password())
                .await
            {
                Ok(_) => on_success.call(()),
                Err(e) => {
                    loading.set(false);
                    error.set(Some(e.to_string()));
                }
            }
        });
    };

    let name_hint = format!("at least {MIN_NAME_CHARS} characters");
    let password_hint = format!("Password (min {MIN_PASSWORD_CHARS} characters)");

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "auth-page",
            h1 { class: "view-title", "Create Account" }

            form {
                onsubmit: handle_signup,
                class: "auth-form",

                if let Some(err) = error() {
                    div { class: "view-error", "{err}" }
                }

                input {
                    r#type: "text",
                    placeholder: "First name ({name_hint})",
                    required: true,
                    value: first_name(),
                    oninput: move |evt: FormEvent| first_name.set(evt.value()),
                }

                input {
                    r#type: "text",
                    placeholder: "Last name ({name_hint})",
                    required: true,
                    value: last_name(),
                    oninput: move |evt: FormEvent| last_name.set(evt.value()),
                }

                input {
                    r#type: "email",
                    placeholder: "Email",
                    required: true,
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                input {
                    r#type: "password",
                    placeholder: "{password_hint}",
                    required: true,
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Creating account..." } else { "Sign up" }
                }
            }

            p {
                class: "view-muted",
                "Already have an account? "
                button {
                    class: "btn btn-link",
                    onclick: move |_| on_login.call(()),
                    "Login"
                }
            }
        }
    }
}
