use api::{LoadState, Post};
use dioxus::prelude::*;

use crate::views::LoadError;
use crate::{use_auth, use_cancellation, use_services, PostCard};

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// Outcome of one of the profile forms.
#[derive(Debug, Clone, PartialEq)]
enum Status {
    Saved(&'static str),
    Failed(String),
}

#[component]
fn StatusLine(status: Option<Status>) -> Element {
    match status {
        Some(Status::Saved(message)) => rsx! {
            p { class: "view-notice", "{message}" }
        },
        Some(Status::Failed(message)) => rsx! {
            p { class: "view-error", "{message}" }
        },
        None => rsx! {},
    }
}

/// The signed-in user's profile: details, name and bio editing, password
/// change, and their posts.
#[component]
pub fn ProfileView() -> Element {
    let services = use_services();
    let auth = use_auth();
    let token = use_cancellation();

    let mut name = use_signal(String::new);
    let mut bio = use_signal(String::new);
    let mut profile_status = use_signal(|| Option::<Status>::None);

    let mut new_password = use_signal(String::new);
    let mut password_status = use_signal(|| Option::<Status>::None);

    let mut mine = use_signal(LoadState::<Vec<Post>>::default);

    // Seed the form from the session whenever the signed-in user changes
    use_effect(move || {
        if let Some(user) = auth().user {
            name.set(user.display_name.clone());
            bio.set(user.bio.clone().unwrap_or_default());
        }
    });

    let posts = services.posts.clone();
    let mut loader = use_resource(move || {
        let user = auth().user;
        let posts = posts.clone();
        let token = token.clone();
        async move {
            let Some(user) = user else {
                return;
            };
            mine.write().start();
            if let Some(result) = token.guard(posts.list_by_author(&user.id)).await {
                mine.write().finish(result);
            }
        }
    });

    let session = services.session.clone();
    let save_profile = move |evt: FormEvent| {
        evt.prevent_default();
        let session = session.clone();
        spawn(async move {
            profile_status.set(None);
            match session.update_profile(&name(), &bio()).await {
                Ok(_) => profile_status.set(Some(Status::Saved("Profile updated."))),
                Err(e) => profile_status.set(Some(Status::Failed(e.to_string()))),
            }
        });
    };

    let session = services.session.clone();
    let change_password = move |evt: FormEvent| {
        evt.prevent_default();
        let session = session.clone();
        spawn(async move {
            password_status.set(None);
            match session.change_password(&new_password()).await {
                Ok(()) => {
                    new_password.set(String::new());
                    password_status.set(Some(Status::Saved("Password changed successfully.")));
                }
                Err(e) => password_status.set(Some(Status::Failed(e.to_string()))),
            }
        });
    };

    let Some(user) = auth().user else {
        return rsx! {
            document::Link { rel: "stylesheet", href: VIEWS_CSS }
            div {
                class: "view-page",
                p { class: "view-muted", "No user is logged in." }
            }
        };
    };
    let shown_bio = user.bio.clone().unwrap_or_else(|| "No bio available.".to_string());

    let listing = match &*mine.read() {
        LoadState::Idle | LoadState::Loading => rsx! {
            p { class: "view-muted", "Loading your blogs..." }
        },
        LoadState::Errored(message) => rsx! {
            LoadError { message: message.clone(), on_retry: move |_| { loader.restart(); } }
        },
        LoadState::Loaded(written) if written.is_empty() => rsx! {
            p { class: "view-muted", "No blogs posted yet." }
        },
        LoadState::Loaded(written) => rsx! {
            for post in written.iter().cloned() {
                PostCard { key: "{post.id}", post, truncate: true }
            }
        },
    };

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "view-page",
            h1 { class: "view-title", "{user.display_name}" }
            p { class: "view-muted", "{user.email}" }
            p { class: "author-bio", "{shown_bio}" }

            div {
                class: "mb-8",
                h2 { class: "view-section-title", "Edit profile" }
                form {
                    class: "auth-form",
                    onsubmit: save_profile,
                    StatusLine { status: profile_status() }
                    label { r#for: "profile-name", "Name" }
                    input {
                        id: "profile-name",
                        r#type: "text",
                        value: name(),
                        oninput: move |evt: FormEvent| name.set(evt.value()),
                    }
                    label { r#for: "profile-bio", "Bio" }
                    textarea {
                        id: "profile-bio",
                        rows: "4",
                        value: bio(),
                        oninput: move |evt: FormEvent| bio.set(evt.value()),
                    }
                    button { class: "btn btn-primary", r#type: "submit", "Save profile" }
                }
            }

            div {
                class: "mb-8",
                h2 { class: "view-section-title", "Change password" }
                form {
                    class: "auth-form",
                    onsubmit: change_password,
                    StatusLine { status: password_status() }
                    input {
                        r#type: "password",
                        placeholder: "New password",
                        value: new_password(),
                        oninput: move |evt: FormEvent| new_password.set(evt.value()),
                    }
                    button { class: "btn btn-primary", r#type: "submit", "Change password" }
                }
            }

            div {
                h2 { class: "view-section-title", "Your blogs" }
                {listing}
            }
        }
    }
}
