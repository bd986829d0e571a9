//! Login page view with email/password form.

use dioxus::prelude::*;

use crate::use_services;

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// Login page component.
#[component]
pub fn LoginView(on_success: EventHandler<()>, on_signup: EventHandler<()>) -> Element {
    let services = use_services();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        let session = services.session.clone();
        spawn(async move {
            error.set(None);
            loading.set(true);
            match session.sign_in(&email(), &password()).await {
                Ok(_) => on_success.call(()),
                Err(e) => {
                    loading.set(false);
                    error.set(Some(e.to_string()));
                }
            }
        });
    };

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "auth-page",
            h1 { class: "view-title", "Login" }

            form {
                onsubmit: handle_login,
                class: "auth-form",

                if let Some(err) = error() {
                    div { class: "view-error", "{err}" }
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
                    placeholder: "Password",
                    required: true,
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Logging in..." } else { "Login" }
                }
            }

            p {
                class: "view-muted",
                "No account yet? "
                button {
                    class: "btn btn-link",
                    onclick: move |_| on_signup.call(()),
                    "Sign up"
                }
            }
        }
    }
}
