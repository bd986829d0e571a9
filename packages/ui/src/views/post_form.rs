use api::posts::{BODY_CHARS, TITLE_CHARS};
use dioxus::prelude::*;

/// Title and body fields with live character counts.
#[component]
pub fn PostForm(
    title: Signal<String>,
    body: Signal<String>,
    submit_label: String,
    #[props(default)] busy: bool,
    error: Option<String>,
    on_submit: EventHandler<()>,
) -> Element {
    let mut title = title;
    let mut body = body;
    let title_chars = title.read().chars().count();
    let body_chars = body.read().chars().count();
    let title_max = *TITLE_CHARS.end();
    let body_max = *BODY_CHARS.end();

    rsx! {
        form {
            class: "post-form",
            onsubmit: move |evt: FormEvent| {
                evt.prevent_default();
                on_submit.call(());
            },
            if let Some(err) = error {
                div { class: "view-error", "{err}" }
            }
            label { r#for: "post-title", "Title" }
            input {
                id: "post-title",
                r#type: "text",
                value: "{title}",
                oninput: move |evt: FormEvent| title.set(evt.value()),
            }
            p { class: "view-muted", "{title_chars}/{title_max}" }
            label { r#for: "post-body", "Body (Markdown)" }
            textarea {
                id: "post-body",
                rows: "12",
                value: "{body}",
                oninput: move |evt: FormEvent| body.set(evt.value()),
            }
            p { class: "view-muted", "{body_chars}/{body_max}" }
            button {
                class: "btn btn-primary",
                r#type: "submit",
                disabled: busy,
                if busy { "Saving..." } else { "{submit_label}" }
            }
        }
    }
}
