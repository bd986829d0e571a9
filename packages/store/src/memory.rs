use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::backend::{children, AuthBackend, BackendError, DocumentStore};
use crate::models::{AuthAccount, UserId};
use crate::watch::{AuthListeners, AuthWatch};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug)]
struct Credential {
    uid: UserId,
    password: String,
    display_name: Option<String>,
}

/// In-memory backend for testing and offline use.
///
/// Clones share state, like handles to the same hosted project.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    root: Arc<Mutex<Value>>,
    accounts: Arc<Mutex<HashMap<String, Credential>>>,
    current: Arc<Mutex<Option<String>>>,
    store_offline: Arc<AtomicBool>,
    remove_status: Arc<Mutex<Option<u16>>>,
    listeners: AuthListeners,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every document store call fail with [`BackendError::Unavailable`].
    /// Auth calls keep working.
    pub fn set_store_offline(&self, offline: bool) {
        self.store_offline.store(offline, Ordering::SeqCst);
    }

    /// Make every `remove` answer with HTTP `status`, as the hosted store does for
    /// a rejected delete. `None` restores normal behaviour.
    pub fn set_remove_status(&self, status: Option<u16>) {
        *self.remove_status.lock().unwrap() = status;
    }

    /// Whether an account exists for `email`.
    pub fn has_account(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .unwrap()
            .contains_key(&email.trim().to_lowercase())
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.store_offline.load(Ordering::SeqCst) {
            Err(BackendError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn account_for(&self, email: &str) -> Option<AuthAccount> {
        let accounts = self.accounts.lock().unwrap();
        accounts.get(email).map(|c| AuthAccount {
            uid: c.uid.clone(),
            email: email.to_string(),
            display_name: c.display_name.clone(),
        })
    }

    /// Switch the signed-in account, telling listeners when it changed.
    fn set_current(&self, email: Option<String>) {
        let changed = {
            let mut current = self.current.lock().unwrap();
            let changed = *current != email;
            *current = email;
            changed
        };
        if changed {
            let account = self.current_account();
            self.listeners.notify(account.as_ref());
        }
    }

    fn signed_in_email(&self) -> Result<String, BackendError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or(BackendError::NotSignedIn)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path)
        .into_iter()
        .try_fold(root, |node, seg| node.as_object()?.get(seg))
}

/// Object at `path`, creating (or replacing non-objects with) empty objects on the way.
fn object_at<'a>(root: &'a mut Value, path: &[&str]) -> &'a mut Map<String, Value> {
    let mut node = root;
    for seg in path {
        node = ensure_object(node)
            .entry(seg.to_string())
            .or_insert(Value::Null);
    }
    ensure_object(node)
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn set_at(root: &mut Value, path: &str, value: Value) {
    let segs = segments(path);
    let Some((leaf, parents)) = segs.split_last() else {
        *root = value;
        return;
    };
    if value.is_null() {
        remove_at(root, path);
        return;
    }
    object_at(root, parents).insert(leaf.to_string(), value);
}

fn remove_at(root: &mut Value, path: &str) {
    let segs = segments(path);
    let Some((leaf, parents)) = segs.split_last() else {
        *root = Value::Null;
        return;
    };
    let parent = parents
        .iter()
        .try_fold(&mut *root, |node, seg| node.as_object_mut()?.get_mut(*seg));
    if let Some(Value::Object(map)) = parent {
        map.remove(*leaf);
    }
}

impl AuthBackend for MemoryBackend {
    fn current_account(&self) -> Option<AuthAccount> {
        let email = self.current.lock().unwrap().clone()?;
        self.account_for(&email)
    }

    fn on_auth_state_change(&self, listener: impl Fn(Option<&AuthAccount>) + 'static) -> AuthWatch {
        self.listeners.subscribe(listener)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(BackendError::auth(
                "INVALID_EMAIL",
                "The email address is badly formatted.",
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::auth(
                "WEAK_PASSWORD",
                "Password should be at least 6 characters.",
            ));
        }
        {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(&email) {
                return Err(BackendError::auth(
                    "EMAIL_EXISTS",
                    "The email address is already in use by another account.",
                ));
            }
            accounts.insert(
                email.clone(),
                Credential {
                    uid: UserId::new(uuid::Uuid::new_v4().simple().to_string()),
                    password: password.to_string(),
                    display_name: None,
                },
            );
        }
        self.set_current(Some(email.clone()));
        self.account_for(&email).ok_or(BackendError::NotSignedIn)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let email = email.trim().to_lowercase();
        let valid = self
            .accounts
            .lock()
            .unwrap()
            .get(&email)
            .is_some_and(|c| c.password == password);
        if !valid {
            return Err(BackendError::auth(
                "INVALID_LOGIN_CREDENTIALS",
                "Invalid email or password.",
            ));
        }
        self.set_current(Some(email.clone()));
        self.account_for(&email).ok_or(BackendError::NotSignedIn)
    }

    async fn sign_out(&self) {
        self.set_current(None);
    }

    async fn update_display_name(&self, name: &str) -> Result<(), BackendError> {
        let email = self.signed_in_email()?;
        if let Some(c) = self.accounts.lock().unwrap().get_mut(&email) {
            c.display_name = Some(name.to_string());
        }
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<(), BackendError> {
        let email = self.signed_in_email()?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::auth(
                "WEAK_PASSWORD",
                "Password should be at least 6 characters.",
            ));
        }
        if let Some(c) = self.accounts.lock().unwrap().get_mut(&email) {
            c.password = password.to_string();
        }
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), BackendError> {
        let email = self.signed_in_email()?;
        self.accounts.lock().unwrap().remove(&email);
        self.set_current(None);
        Ok(())
    }
}

impl DocumentStore for MemoryBackend {
    async fn read(&self, path: &str) -> Result<Option<Value>, BackendError> {
        self.check_online()?;
        let root = self.root.lock().unwrap();
        Ok(lookup(&root, path).filter(|v| !v.is_null()).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), BackendError> {
        self.check_online()?;
        set_at(&mut self.root.lock().unwrap(), path, value);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, BackendError> {
        self.check_online()?;
        let key = format!("-{}", uuid::Uuid::new_v4().simple());
        set_at(&mut self.root.lock().unwrap(), &format!("{path}/{key}"), value);
        Ok(key)
    }

    async fn update(&self, path: &str, patch: Value) -> Result<(), BackendError> {
        self.check_online()?;
        let Value::Object(fields) = patch else {
            return Err(BackendError::Decode("update patch must be an object".to_string()));
        };
        let mut root = self.root.lock().unwrap();
        for (field, value) in fields {
            set_at(&mut root, &format!("{path}/{field}"), value);
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), BackendError> {
        self.check_online()?;
        if let Some(status) = *self.remove_status.lock().unwrap() {
            return Err(BackendError::Status {
                status,
                message: "rejected".to_string(),
            });
        }
        remove_at(&mut self.root.lock().unwrap(), path);
        Ok(())
    }

    async fn query(
        &self,
        path: &str,
        field: &str,
        equals: &str,
    ) -> Result<Vec<(String, Value)>, BackendError> {
        let collection = self.read(path).await?;
        Ok(children(collection)
            .into_iter()
            .filter(|(_, child)| child.get(field).and_then(Value::as_str) == Some(equals))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_and_read() {
        let backend = MemoryBackend::new();
        assert!(backend.read("users/u1").await.unwrap().is_none());

        backend
            .write("users/u1", json!({ "name": "Ada" }))
            .await
            .unwrap();

        let value = backend.read("users/u1").await.unwrap().unwrap();
        assert_eq!(value["name"], "Ada");
        let users = backend.read("users").await.unwrap().unwrap();
        assert!(users.get("u1").is_some());
    }

    #[tokio::test]
    async fn test_push_generates_distinct_keys() {
        let backend = MemoryBackend::new();
        let a = backend.push("blogs", json!({ "title": "a" })).await.unwrap();
        let b = backend.push("blogs", json!({ "title": "b" })).await.unwrap();
        assert_ne!(a, b);

        let blogs = children(backend.read("blogs").await.unwrap());
        assert_eq!(blogs.len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let backend = MemoryBackend::new();
        backend
            .write("blogs/p1", json!({ "title": "old", "body": "old", "userId": "u1" }))
            .await
            .unwrap();

        backend
            .update("blogs/p1", json!({ "title": "new", "body": "new" }))
            .await
            .unwrap();

        let post = backend.read("blogs/p1").await.unwrap().unwrap();
        assert_eq!(post, json!({ "title": "new", "body": "new", "userId": "u1" }));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.write("blogs/p1", json!({ "title": "t" })).await.unwrap();

        backend.remove("blogs/p1").await.unwrap();
        assert!(backend.read("blogs/p1").await.unwrap().is_none());

        backend.remove("blogs/p1").await.unwrap();
        backend.remove("nothing/here/at/all").await.unwrap();
    }

    #[tokio::test]
    async fn test_query_filters_by_field() {
        let backend = MemoryBackend::new();
        backend.write("blogs/p1", json!({ "userId": "u1" })).await.unwrap();
        backend.write("blogs/p2", json!({ "userId": "u2" })).await.unwrap();
        backend.write("blogs/p3", json!({ "userId": "u1" })).await.unwrap();

        let mut keys: Vec<String> = backend
            .query("blogs", "userId", "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["p1", "p3"]);

        assert!(backend.query("missing", "userId", "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_store() {
        let backend = MemoryBackend::new();
        backend.set_store_offline(true);
        assert_eq!(
            backend.read("blogs").await.unwrap_err(),
            BackendError::Unavailable
        );
        backend.set_store_offline(false);
        assert!(backend.read("blogs").await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let backend = MemoryBackend::new();
        assert!(backend.current_account().is_none());

        let account = backend.sign_up("A@x.com", "password").await.unwrap();
        assert_eq!(account.email, "a@x.com");
        assert_eq!(backend.current_account(), Some(account.clone()));

        backend.sign_out().await;
        assert!(backend.current_account().is_none());

        let again = backend.sign_in("a@x.com", "password").await.unwrap();
        assert_eq!(again.uid, account.uid);

        let err = backend.sign_in("a@x.com", "wrong-password").await.unwrap_err();
        assert!(matches!(err, BackendError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let backend = MemoryBackend::new();
        backend.sign_up("a@x.com", "password").await.unwrap();

        let dup = backend.sign_up("a@x.com", "password").await.unwrap_err();
        assert!(matches!(dup, BackendError::Auth { ref code, .. } if code == "EMAIL_EXISTS"));

        let weak = backend.sign_up("b@x.com", "123").await.unwrap_err();
        assert!(matches!(weak, BackendError::Auth { ref code, .. } if code == "WEAK_PASSWORD"));

        let bad = backend.sign_up("not-an-email", "password").await.unwrap_err();
        assert!(matches!(bad, BackendError::Auth { ref code, .. } if code == "INVALID_EMAIL"));
    }

    #[tokio::test]
    async fn test_display_name_and_delete() {
        let backend = MemoryBackend::new();
        assert_eq!(
            backend.update_display_name("Ada").await.unwrap_err(),
            BackendError::NotSignedIn
        );

        backend.sign_up("a@x.com", "password").await.unwrap();
        backend.update_display_name("Ada").await.unwrap();
        assert_eq!(
            backend.current_account().unwrap().display_name.as_deref(),
            Some("Ada")
        );

        backend.delete_account().await.unwrap();
        assert!(backend.current_account().is_none());
        assert!(!backend.has_account("a@x.com"));
    }

    #[tokio::test]
    async fn test_auth_state_changes_are_reported() {
        let backend = MemoryBackend::new();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        let watch = backend.on_auth_state_change(move |account| {
            sink.borrow_mut().push(account.map(|a| a.email.clone()))
        });

        backend.sign_up("a@x.com", "password").await.unwrap();
        backend.sign_in("a@x.com", "password").await.unwrap();
        backend.sign_out().await;
        backend.sign_out().await;
        drop(watch);
        backend.sign_in("a@x.com", "password").await.unwrap();

        assert_eq!(*seen.borrow(), vec![Some("a@x.com".to_string()), None]);
    }

    #[tokio::test]
    async fn test_remove_status_switch() {
        let backend = MemoryBackend::new();
        backend.set_remove_status(Some(404));
        assert!(matches!(
            backend.remove("blogs/p1").await.unwrap_err(),
            BackendError::Status { status: 404, .. }
        ));
        backend.set_remove_status(None);
        backend.remove("blogs/p1").await.unwrap();
    }
}
