use api::{FeedEntry, LoadState, User, UserId};
use dioxus::prelude::*;

use crate::views::LoadError;
use crate::{use_auth, use_cancellation, use_services, LogoutButton, PostCard};

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

fn welcome(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("Welcome, {}!", user.email),
        None => "Welcome! ".to_string(),
    }
}

/// Home feed: every post, newest first, with author name and email.
#[component]
pub fn HomeView(
    on_author: EventHandler<UserId>,
    on_login: EventHandler<()>,
    on_signup: EventHandler<()>,
    /// Called after the welcome line's logout button has signed out.
    on_logout: EventHandler<()>,
) -> Element {
    let services = use_services();
    let auth = use_auth();
    let token = use_cancellation();
    let mut feed = use_signal(LoadState::<Vec<FeedEntry>>::default);

    let mut loader = use_resource(move || {
        let posts = services.posts.clone();
        let token = token.clone();
        async move {
            feed.write().start();
            if let Some(result) = token.guard(posts.list_feed()).await {
                feed.write().finish(result);
            }
        }
    });

    let listing = match &*feed.read() {
        LoadState::Idle | LoadState::Loading => rsx! {
            p { class: "view-muted", "Loading blogs..." }
        },
        LoadState::Errored(message) => rsx! {
            LoadError { message: message.clone(), on_retry: move |_| { loader.restart(); } }
        },
        LoadState::Loaded(entries) if entries.is_empty() => rsx! {
            p { class: "view-muted", "No blogs available." }
        },
        LoadState::Loaded(entries) => rsx! {
            for entry in entries.iter().cloned() {
                PostCard {
                    key: "{entry.post.id}",
                    post: entry.post,
                    truncate: true,
                    show_author: true,
                    author_email: entry.author_email,
                    on_author: on_author,
                }
            }
        },
    };

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "view-page",
            div {
                class: "welcome",
                span { {welcome(auth().user.as_ref())} }
                if auth().user.is_some() {
                    LogoutButton { class: "btn btn-secondary", on_logout: on_logout }
                } else {
                    button {
                        class: "btn btn-link",
                        onclick: move |_| on_login.call(()),
                        "Login"
                    }
                    button {
                        class: "btn btn-link",
                        onclick: move |_| on_signup.call(()),
                        "Signup"
                    }
                }
            }
            h1 { class: "view-title", "Latest blogs" }
            {listing}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_uses_email() {
        let ada = User {
            id: UserId::new("u1"),
            display_name: "Ada Lovelace".to_string(),
            email: "ada@x.com".to_string(),
            bio: None,
        };
        assert_eq!(welcome(Some(&ada)), "Welcome, ada@x.com!");
        assert_eq!(welcome(None), "Welcome! ");
    }
}
