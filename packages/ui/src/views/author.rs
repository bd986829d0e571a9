use api::{LoadState, Post, StoreError, User, UserId};
use dioxus::prelude::*;

use crate::views::LoadError;
use crate::{use_cancellation, use_services, PostCard};

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// Name shown for an author. Posts can outlive their author's profile record.
fn author_name(author: Option<&User>) -> String {
    author.map_or_else(|| "Author".to_string(), |a| a.display_name.clone())
}

/// Profile and posts of one author.
#[component]
pub fn AuthorView(
    /// Author id from the route.
    author_id: String,
) -> Element {
    // Track the id in a signal so the loader re-runs when the route param changes
    let mut id_signal = use_signal(|| author_id.clone());
    if *id_signal.peek() != author_id {
        id_signal.set(author_id.clone());
    }

    let services = use_services();
    let token = use_cancellation();
    let mut page = use_signal(LoadState::<(Option<User>, Vec<Post>)>::default);

    let mut loader = use_resource(move || {
        let id = UserId::new(id_signal());
        let users = services.users.clone();
        let posts = services.posts.clone();
        let token = token.clone();
        async move {
            page.write().start();
            let fetch = async {
                let author = users.get(&id).await?;
                let written = posts.list_by_author(&id).await?;
                Ok::<_, StoreError>((author, written))
            };
            if let Some(result) = token.guard(fetch).await {
                page.write().finish(result);
            }
        }
    });

    let content = match &*page.read() {
        LoadState::Idle | LoadState::Loading => rsx! {
            p { class: "view-muted", "Loading author..." }
        },
        LoadState::Errored(message) => rsx! {
            LoadError { message: message.clone(), on_retry: move |_| { loader.restart(); } }
        },
        LoadState::Loaded((author, written)) => {
            let name = author_name(author.as_ref());
            rsx! {
                h1 { class: "view-title", "{name}" }
                if let Some(author) = author {
                    p { class: "view-muted", "{author.email}" }
                    p {
                        class: "author-bio",
                        {author.bio.clone().unwrap_or_else(|| "No bio available.".to_string())}
                    }
                } else {
                    p { class: "view-muted", "Author not found" }
                }
                h2 { class: "view-section-title", "Blogs by {name}" }
                if written.is_empty() {
                    p { class: "view-muted", "No blogs posted yet." }
                }
                for post in written.iter().cloned() {
                    PostCard { key: "{post.id}", post }
                }
            }
        }
    };

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "view-page",
            {content}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_name() {
        let ada = User {
            id: UserId::new("u1"),
            display_name: "Ada Lovelace".to_string(),
            email: "ada@x.com".to_string(),
            bio: None,
        };
        assert_eq!(author_name(Some(&ada)), "Ada Lovelace");
        assert_eq!(author_name(None), "Author");
    }
}
