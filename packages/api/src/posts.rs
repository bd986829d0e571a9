//! # Post repository
//!
//! Maps the post verbs onto the document store: posts live under `blogs/`, each a
//! [`PostRecord`] keyed by a store-generated push key.
//!
//! | Method | Store calls |
//! |--------|-------------|
//! | [`create`](PostRepository::create) | [`validate`], then `push("blogs", record)` |
//! | [`get`](PostRepository::get) | `read("blogs/{id}")` |
//! | [`list_all`](PostRepository::list_all) | `read("blogs")` |
//! | [`list_by_author`](PostRepository::list_by_author) | `query("blogs", "userId", author)` |
//! | [`list_feed`](PostRepository::list_feed) | `read("blogs")` and `read("users")` concurrently |
//! | [`update`](PostRepository::update) | [`validate`], existence check, `update("blogs/{id}", {title, body})` |
//! | [`delete`](PostRepository::delete) | `remove("blogs/{id}")` |
//!
//! Every list comes back newest first. Records that fail to decode are dropped
//! with a warning rather than failing the whole list.
//!
//! The repository does not check who owns a post before updating or deleting it;
//! only the dashboard flow, which lists the signed-in user's own posts, gates that.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use store::backend::children;
use store::models::{format_timestamp, post_path, PostRecord, BLOGS, POST_AUTHOR_FIELD, USERS};
use store::{BackendError, DocumentStore, Post, PostId, User, UserId};

use crate::error::{PostError, StoreError, ValidationError};
use crate::users::decode_users;

/// Accepted title length, in characters.
pub const TITLE_CHARS: RangeInclusive<usize> = 5..=50;
/// Accepted body length, in characters.
pub const BODY_CHARS: RangeInclusive<usize> = 100..=3000;

const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Check title and body lengths.
pub fn validate(title: &str, body: &str) -> Result<(), ValidationError> {
    let title_chars = title.chars().count();
    let body_chars = body.chars().count();
    if TITLE_CHARS.contains(&title_chars) && BODY_CHARS.contains(&body_chars) {
        Ok(())
    } else {
        Err(ValidationError {
            title_chars,
            body_chars,
        })
    }
}

/// Source of post creation times.
pub type Clock = Rc<dyn Fn() -> DateTime<Utc>>;

/// A home feed entry: a post plus its author's email, when the author is known.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedEntry {
    pub post: Post,
    pub author_email: Option<String>,
}

/// Post CRUD over a [`DocumentStore`].
#[derive(Clone)]
pub struct PostRepository<S> {
    store: S,
    clock: Clock,
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

fn decode_posts(entries: Vec<(String, Value)>) -> Vec<Post> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match Post::decode(&key, value) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!("skipping post: {e}");
                None
            }
        })
        .collect()
}

impl<S: DocumentStore> PostRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Rc::new(Utc::now),
        }
    }

    /// Replace the clock used to stamp new posts.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    /// Validate and store a new post. Returns the generated id.
    pub async fn create(
        &self,
        author_id: &UserId,
        author_name: &str,
        title: &str,
        body: &str,
    ) -> Result<PostId, PostError> {
        validate(title, body)?;

        let author = match author_name.trim() {
            "" => ANONYMOUS_AUTHOR,
            name => name,
        };
        let record = PostRecord {
            user_id: author_id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            author: author.to_string(),
            date: format_timestamp(&(self.clock)()),
        };
        let value = serde_json::to_value(&record).map_err(|e| BackendError::Decode(e.to_string()))?;
        let key = self.store.push(BLOGS, value).await?;
        tracing::debug!(post = %key, author = %author_id, "created post");
        Ok(PostId::new(key))
    }

    /// A single post, `None` when absent or unreadable.
    pub async fn get(&self, id: &PostId) -> Result<Option<Post>, StoreError> {
        let Some(value) = self.store.read(&post_path(id)).await? else {
            return Ok(None);
        };
        match Post::decode(id.as_str(), value) {
            Ok(post) => Ok(Some(post)),
            Err(e) => {
                tracing::warn!("unreadable post: {e}");
                Ok(None)
            }
        }
    }

    /// Every post, newest first.
    pub async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let collection = self.store.read(BLOGS).await?;
        Ok(newest_first(decode_posts(children(collection))))
    }

    /// Posts written by `author`, newest first.
    pub async fn list_by_author(&self, author: &UserId) -> Result<Vec<Post>, StoreError> {
        let entries = self
            .store
            .query(BLOGS, POST_AUTHOR_FIELD, author.as_str())
            .await?;
        let posts = decode_posts(entries)
            .into_iter()
            .filter(|p| &p.author_id == author)
            .collect();
        Ok(newest_first(posts))
    }

    /// Every post with its author's email, newest first.
    pub async fn list_feed(&self) -> Result<Vec<FeedEntry>, StoreError> {
        let (posts, users) = futures::try_join!(self.store.read(BLOGS), self.store.read(USERS))?;
        let users: HashMap<UserId, User> = decode_users(users);
        Ok(newest_first(decode_posts(children(posts)))
            .into_iter()
            .map(|post| FeedEntry {
                author_email: users.get(&post.author_id).map(|u| u.email.clone()),
                post,
            })
            .collect())
    }

    /// Overwrite the title and body of an existing post.
    pub async fn update(&self, id: &PostId, title: &str, body: &str) -> Result<(), PostError> {
        validate(title, body)?;

        let path = post_path(id);
        if self.store.read(&path).await?.is_none() {
            return Err(StoreError::NotFound.into());
        }
        self.store
            .update(&path, json!({ "title": title, "body": body }))
            .await?;
        tracing::debug!(post = %id, "updated post");
        Ok(())
    }

    /// Delete a post. Deleting a post that is already gone succeeds.
    pub async fn delete(&self, id: &PostId) -> Result<(), StoreError> {
        match self.store.remove(&post_path(id)).await {
            Ok(()) => tracing::debug!(post = %id, "deleted post"),
            Err(BackendError::Status { status: 404, .. }) => {
                tracing::debug!(post = %id, "post already deleted");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
