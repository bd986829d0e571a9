//! # Domain models for users and posts
//!
//! Typed entities handed out by the store layer, plus the wire records that are
//! actually persisted in the document store. Every record read back from the
//! backend goes through a decode step ([`User::decode`], [`Post::decode`]) that
//! rejects malformed documents instead of passing partial objects upward.
//!
//! ## Document layout
//!
//! | Path | Record |
//! |------|--------|
//! | `users/{userId}` | [`UserRecord`]: `{name, email, userId, bio?}` |
//! | `blogs/{postId}` | [`PostRecord`]: `{userId, title, body, author, date}` |
//!
//! `userId` is the one canonical author field: posts are written with it and
//! author queries filter on it ([`POST_AUTHOR_FIELD`]).
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision
//! (`2024-05-01T10:00:00.000Z`), see [`format_timestamp`].

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Collection holding one profile document per user.
pub const USERS: &str = "users";
/// Collection holding one document per post.
pub const BLOGS: &str = "blogs";
/// Field of a post document that references its author.
pub const POST_AUTHOR_FIELD: &str = "userId";

/// Path of a user's profile document.
pub fn user_path(id: &UserId) -> String {
    format!("{USERS}/{id}")
}

/// Path of a post document.
pub fn post_path(id: &PostId) -> String {
    format!("{BLOGS}/{id}")
}

/// Auth-issued user identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-generated post identifier (a push key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An account as reported by the auth collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAccount {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// A user profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub bio: Option<String>,
}

impl User {
    /// Session user built from an auth account alone, before any profile is read.
    ///
    /// The display name falls back to the email address.
    pub fn from_account(account: &AuthAccount) -> Self {
        Self {
            id: account.uid.clone(),
            display_name: account
                .display_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| account.email.clone()),
            email: account.email.clone(),
            bio: None,
        }
    }

    /// Decode a `users/{key}` document.
    pub fn decode(key: &str, value: Value) -> Result<Self, DecodeError> {
        let record: UserRecord = serde_json::from_value(value).map_err(|e| DecodeError {
            collection: USERS,
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        if record.user_id.as_str().is_empty() {
            return Err(DecodeError {
                collection: USERS,
                key: key.to_string(),
                reason: "empty userId".to_string(),
            });
        }
        Ok(Self {
            id: record.user_id,
            display_name: record.name,
            email: record.email,
            bio: record.bio.filter(|b| !b.trim().is_empty()),
        })
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            name: self.display_name.clone(),
            email: self.email.clone(),
            user_id: self.id.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// A blog post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    /// Author display name captured when the post was created.
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Decode a `blogs/{key}` document.
    pub fn decode(key: &str, value: Value) -> Result<Self, DecodeError> {
        let invalid = |reason: String| DecodeError {
            collection: BLOGS,
            key: key.to_string(),
            reason,
        };
        let record: PostRecord = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        if record.user_id.as_str().is_empty() {
            return Err(invalid("empty userId".to_string()));
        }
        let created_at = parse_timestamp(&record.date)
            .map_err(|e| invalid(format!("bad date {:?}: {e}", record.date)))?;
        Ok(Self {
            id: PostId::new(key),
            author_id: record.user_id,
            author_name: record.author,
            title: record.title,
            body: record.body,
            created_at,
        })
    }
}

/// Persisted shape of `users/{userId}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Persisted shape of `blogs/{postId}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub date: String,
}

/// A document that could not be turned into a typed entity.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed {collection} record {key}: {reason}")]
pub struct DecodeError {
    pub collection: &'static str,
    pub key: String,
    pub reason: String,
}

/// Format a timestamp the way it is stored in post documents.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decode_post() {
        let post = Post::decode(
            "-Nabc",
            json!({
                "userId": "u1",
                "title": "Hello",
                "body": "Body",
                "author": "Ada Lovelace",
                "date": "2024-05-01T10:00:00.000Z",
            }),
        )
        .unwrap();
        assert_eq!(post.id, PostId::new("-Nabc"));
        assert_eq!(post.author_id, UserId::new("u1"));
        assert_eq!(post.author_name, "Ada Lovelace");
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_post_rejects_missing_fields() {
        let err = Post::decode("k", json!({ "title": "Hello" })).unwrap_err();
        assert_eq!(err.collection, BLOGS);
        assert_eq!(err.key, "k");
    }

    #[test]
    fn test_decode_post_rejects_bad_date() {
        let err = Post::decode(
            "k",
            json!({
                "userId": "u1",
                "title": "Hello",
                "body": "Body",
                "author": "A",
                "date": "yesterday",
            }),
        )
        .unwrap_err();
        assert!(err.reason.contains("bad date"));
    }

    #[test]
    fn test_decode_user_with_and_without_bio() {
        let user = User::decode(
            "u1",
            json!({ "name": "Ada Lovelace", "email": "ada@x.com", "userId": "u1" }),
        )
        .unwrap();
        assert_eq!(user.display_name, "Ada Lovelace");
        assert!(user.bio.is_none());

        let user = User::decode(
            "u1",
            json!({ "name": "Ada", "email": "ada@x.com", "userId": "u1", "bio": "Maths" }),
        )
        .unwrap();
        assert_eq!(user.bio.as_deref(), Some("Maths"));
    }

    #[test]
    fn test_user_record_omits_missing_bio() {
        let user = User {
            id: UserId::new("u1"),
            display_name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            bio: None,
        };
        let value = serde_json::to_value(user.to_record()).unwrap();
        assert_eq!(
            value,
            json!({ "name": "Ada", "email": "ada@x.com", "userId": "u1" })
        );
    }

    #[test]
    fn test_from_account_falls_back_to_email() {
        let account = AuthAccount {
            uid: UserId::new("u1"),
            email: "ada@x.com".to_string(),
            display_name: None,
        };
        assert_eq!(User::from_account(&account).display_name, "ada@x.com");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-01T10:00:00.000Z");
        assert_eq!(parse_timestamp("2024-05-01T10:00:00.000Z").unwrap(), ts);
    }
}
