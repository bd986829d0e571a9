use api::{LoadState, Post, PostId};
use dioxus::prelude::*;

use crate::icons::{FaPenToSquare, FaTrash};
use crate::views::{ConfirmDialog, LoadError, PostForm};
use crate::{use_auth, use_cancellation, use_services, Icon, PostCard};

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// The signed-in user's workspace: write a post, edit or delete their own.
///
/// Without a session it immediately asks the shell to go to the login page.
#[component]
pub fn DashboardView(on_login: EventHandler<()>, on_edit: EventHandler<PostId>) -> Element {
    let services = use_services();
    let auth = use_auth();
    let token = use_cancellation();

    let mut mine = use_signal(LoadState::<Vec<Post>>::default);
    let mut reload = use_signal(|| 0u32);

    let title = use_signal(String::new);
    let body = use_signal(String::new);
    let mut form_error = use_signal(|| Option::<String>::None);
    let mut notice = use_signal(|| Option::<String>::None);
    let mut saving = use_signal(|| false);
    let mut pending_delete = use_signal(|| Option::<PostId>::None);

    use_effect(move || {
        if auth().user.is_none() {
            on_login.call(());
        }
    });

    let posts = services.posts.clone();
    let _loader = use_resource(move || {
        let user = auth().user;
        let _ = reload();
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

    let posts = services.posts.clone();
    let on_create = move |_: ()| {
        let posts = posts.clone();
        let mut title = title;
        let mut body = body;
        spawn(async move {
            let Some(user) = auth().user else {
                return;
            };
            form_error.set(None);
            notice.set(None);
            saving.set(true);
            match posts
                .create(&user.id, &user.display_name, &title(), &body())
                .await
            {
                Ok(_) => {
                    title.set(String::new());
                    body.set(String::new());
                    notice.set(Some("Blog posted.".to_string()));
                    *reload.write() += 1;
                }
                Err(e) => form_error.set(Some(e.to_string())),
            }
            saving.set(false);
        });
    };

    let posts = services.posts.clone();
    let on_confirm_delete = move |_: ()| {
        let posts = posts.clone();
        let Some(id) = pending_delete.write().take() else {
            return;
        };
        spawn(async move {
            match posts.delete(&id).await {
                Ok(()) => {
                    notice.set(Some("Blog deleted.".to_string()));
                    *reload.write() += 1;
                }
                Err(e) => notice.set(Some(e.to_string())),
            }
        });
    };

    let Some(user) = auth().user else {
        return rsx! {};
    };

    let listing = match &*mine.read() {
        LoadState::Idle | LoadState::Loading => rsx! {
            p { class: "view-muted", "Loading your blogs..." }
        },
        LoadState::Errored(message) => rsx! {
            LoadError { message: message.clone(), on_retry: move |_| *reload.write() += 1 }
        },
        LoadState::Loaded(written) if written.is_empty() => rsx! {
            p { class: "view-muted", "You have not posted any blogs yet." }
        },
        LoadState::Loaded(written) => rsx! {
            for post in written.iter().cloned() {
                PostCard {
                    key: "{post.id}",
                    post: post.clone(),
                    truncate: true,
                    button {
                        class: "btn btn-secondary",
                        onclick: {
                            let id = post.id.clone();
                            move |_| on_edit.call(id.clone())
                        },
                        Icon { icon: FaPenToSquare, width: 12, height: 12 }
                        " Edit"
                    }
                    button {
                        class: "btn btn-danger",
                        onclick: {
                            let id = post.id.clone();
                            move |_| pending_delete.set(Some(id.clone()))
                        },
                        Icon { icon: FaTrash, width: 12, height: 12 }
                        " Delete"
                    }
                }
            }
        },
    };

    rsx! {
        document::Link { rel: "stylesheet", href: VIEWS_CSS }
        div {
            class: "view-page",
            h1 { class: "view-title", "Welcome, {user.display_name}" }

            if let Some(message) = notice() {
                div { class: "view-notice", "{message}" }
            }

            div {
                class: "mb-8",
                h2 { class: "view-section-title", "Write a new blog" }
                PostForm {
                    title,
                    body,
                    submit_label: "Post blog",
                    busy: saving(),
                    error: form_error(),
                    on_submit: on_create,
                }
            }

            div {
                h2 { class: "view-section-title", "Your blogs" }
                {listing}
            }

            if pending_delete().is_some() {
                ConfirmDialog {
                    message: "Delete this blog? This cannot be undone.",
                    on_confirm: on_confirm_delete,
                    on_cancel: move |_| pending_delete.set(None),
                }
            }
        }
    }
}
