use api::{Post, UserId};
use chrono::{DateTime, Utc};
use dioxus::prelude::*;

use crate::markdown;

/// Characters of body shown in feed previews.
pub const PREVIEW_CHARS: usize = 200;

/// First `limit` characters of `body`, with an ellipsis when cut.
pub fn preview(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Publication date as shown on cards, in UTC.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y %H:%M UTC").to_string()
}

/// A post summary. `children` are rendered as the card's actions.
#[component]
pub fn PostCard(
    post: Post,
    /// Render only the first [`PREVIEW_CHARS`] characters of the body.
    #[props(default)]
    truncate: bool,
    /// Show the author name and email.
    #[props(default)]
    show_author: bool,
    author_email: Option<String>,
    /// Called with the author's id when the author name is clicked.
    on_author: Option<EventHandler<UserId>>,
    children: Element,
) -> Element {
    let body_html = if truncate {
        markdown::render(&preview(&post.body, PREVIEW_CHARS))
    } else {
        markdown::render(&post.body)
    };
    let date = format_date(&post.created_at);
    let email = author_email.unwrap_or_else(|| "Email not available".to_string());
    let author_id = post.author_id.clone();

    rsx! {
        article {
            class: "post-card",
            h2 { class: "post-card-title", "{post.title}" }
            if show_author {
                p {
                    class: "post-card-meta",
                    "By "
                    if let Some(handler) = on_author {
                        a {
                            class: "post-card-author",
                            href: "#",
                            onclick: move |evt: MouseEvent| {
                                evt.prevent_default();
                                handler.call(author_id.clone());
                            },
                            "{post.author_name}"
                        }
                    } else {
                        span { class: "post-card-author", "{post.author_name}" }
                    }
                }
                p { class: "post-card-meta", "{email}" }
            }
            p { class: "post-card-meta", "Published {date}" }
            div {
                class: "post-card-body",
                dangerous_inner_html: "{body_html}",
            }
            div { class: "post-card-actions", {children} }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_preview_short_body_unchanged() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview(&"a".repeat(200), 200), "a".repeat(200));
    }

    #[test]
    fn test_preview_cuts_on_characters() {
        assert_eq!(preview(&"a".repeat(201), 200), format!("{}...", "a".repeat(200)));
        assert_eq!(preview("ééé", 2), "éé...");
    }

    #[test]
    fn test_format_date() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap();
        assert_eq!(format_date(&ts), "May 1, 2024 09:05 UTC");
    }
}
