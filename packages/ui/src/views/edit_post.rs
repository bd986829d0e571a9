use api::{LoadState, Post, PostId};
use dioxus::prelude::*;

use crate::views::PostForm;
use crate::{use_auth, use_cancellation, use_services};

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// Edit form for one of the signed-in user's posts.
#[component]
pub fn EditPostView(
    /// Post id from the route.
    post_id: String,
    /// Called after a successful save, and on cancel.
    on_done: EventHandler<()>,
) -> Element {
    let mut id_signal = use_signal(|| post_id.clone());
    if *id_signal.peek() != post_id {
        id_signal.set(post_id.clone());
    }

    let services = use_services();
    let auth = use_auth();
    let token = use_cancellation();

    let mut loaded = use_signal(LoadState::<Option<Post>>::default);
    let mut title = use_signal(String::new);
    let mut body = use_signal(String::new);
    let mut form_error = use_signal(|| Option::<String>::None);
    let mut saving = use_signal(|| false);

    let posts = services.posts.clone();
    let _loader = use_resource(move || {
        let id = PostId::new(id_signal());
        let posts = posts.clone();
        let token = token.clone();
        async move {
            loaded.write().start();
            if let Some(result) = token.guard(posts.get(&id)).await {
                if let Ok(Some(post)) = &result {
                    title.set(post.title.clone());
                    body.set(post.body.clone());
                }
                loaded.write().finish(result);
            }
        }
    });

    let posts = services.posts.clone();
    let on_save = move |_: ()| {
        let posts = posts.clone();
        spawn(async move {
            form_error.set(None);
            saving.set(true);
            let id = PostId::new(id_signal());
            match posts.update(&id, &title(), &body()).await {
                Ok(()) => on_done.call(()),
                Err(e) => form_error.set(Some(e.to_string())),
            }
            saving.set(false);
        });
    };

    let user = auth().user;
    let content = match &*loaded.read() {
        LoadState::Idle | LoadState::Loading => rsx! {
            p { class: "view-muted", "Loading blog..." }
        },
        LoadState::Errored(message) => rsx! {
            p { class: "view-error", "{message}" }
        },
        LoadState::Loaded(None) => rsx! {
            p { class: "view-muted", "Blog not found." }
        },
        LoadState::Loaded(Some(post)) => match &user {
            None => rsx! {
                p { class: "view-error", "You need to be logged in to do that." }
            },
            Some(user) if user.id != post.author_id => rsx! {
                p { class: "view-error", "You can only edit your own blogs." }
            },
            Some(_) => rsx! {
                PostForm {
                    title,
                    body,
                    submit_label: "Update blog",
                    busy: saving(),
                    error: form_error(),
                    on_submit: on_save,
                }
                button {
                    class: "btn btn-link",
                    onclick: move |_| on_done.call(()),
                    "Cancel"
                }
            },
        },
    };

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "view-page",
            h1 { class: "view-title", "Edit blog" }
            {content}
        }
    }
}
