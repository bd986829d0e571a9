//! # Session provider
//!
//! Owns "who is signed in" for the whole client. Screens subscribe with
//! [`on_change`](SessionProvider::on_change) and are told about every sign-in,
//! sign-out and profile edit; the returned [`Subscription`] unsubscribes when it is
//! dropped, so a screen that goes away stops hearing about changes.
//!
//! The provider follows the backend's own auth notifications
//! ([`AuthBackend::on_auth_state_change`]), so a sign-out the backend makes by
//! itself (an expired refresh token, an account deleted elsewhere) reaches the
//! screens too. While one of the provider's own auth calls is running it ignores
//! those notifications and publishes the finished result instead.
//!
//! ## Signup
//!
//! A signup is three steps against the backend:
//!
//! 1. create the credential (`AuthBackend::sign_up`), which also signs it in;
//! 2. set the account's display name to `"{first} {last}"`;
//! 3. write the profile document `users/{uid}`.
//!
//! If step 2 or 3 fails the credential is deleted again so no account is left
//! without a profile. The rollback is best effort: when it fails too the error is
//! logged and the account is signed out.
//!
//! Listeners run on the caller's thread after the session value has been updated.
//! They may subscribe or unsubscribe from inside the callback.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use store::models::user_path;
use store::{AuthAccount, AuthBackend, AuthWatch, BackendError, DocumentStore, User, UserId};

use crate::error::AuthError;

/// Minimum characters in each of the first and last name at signup.
pub const MIN_NAME_CHARS: usize = 3;
/// Minimum password characters at signup.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Client-side checks on the signup form.
pub fn validate_signup(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), AuthError> {
    if first_name.trim().chars().count() < MIN_NAME_CHARS
        || last_name.trim().chars().count() < MIN_NAME_CHARS
    {
        return Err(AuthError::Invalid(format!(
            "First and last name must be at least {MIN_NAME_CHARS} characters."
        )));
    }
    if !email.contains('@') {
        return Err(AuthError::Invalid("Enter a valid email address.".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters."
        )));
    }
    Ok(())
}

type Listener = Rc<dyn Fn(Option<&User>)>;

#[derive(Default)]
struct Shared {
    user: RefCell<Option<User>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_id: Cell<u64>,
    /// Provider auth calls in progress.
    driving: Cell<u32>,
    /// Keeps the backend subscription alive.
    _backend_watch: RefCell<Option<AuthWatch>>,
}

impl Shared {
    /// Apply an auth change reported by the backend.
    fn follow(&self, account: Option<&AuthAccount>) {
        if self.driving.get() > 0 {
            return;
        }
        let current = self.user.borrow().clone();
        match (account, current) {
            (None, None) => {}
            (None, Some(user)) => {
                tracing::info!(uid = %user.id, "signed out by the auth service");
                self.set_user(None);
            }
            (Some(account), Some(user)) if account.uid == user.id => {}
            (Some(account), _) => {
                tracing::info!(uid = %account.uid, "signed in by the auth service");
                self.set_user(Some(User::from_account(account)));
            }
        }
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.borrow_mut() = user.clone();
        // Snapshot so listeners can (un)subscribe while being notified.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(user.as_ref());
        }
    }
}

/// Marks a provider auth call in progress for as long as it is alive.
struct Driving<'a>(&'a Shared);

impl<'a> Driving<'a> {
    fn start(shared: &'a Shared) -> Self {
        shared.driving.set(shared.driving.get() + 1);
        Self(shared)
    }
}

impl Drop for Driving<'_> {
    fn drop(&mut self) {
        self.0.driving.set(self.0.driving.get() - 1);
    }
}

/// Handle returned by [`SessionProvider::on_change`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Signed-in state plus the auth verbs that change it.
pub struct SessionProvider<B> {
    backend: B,
    shared: Rc<Shared>,
}

impl<B: Clone> Clone for SessionProvider<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            shared: self.shared.clone(),
        }
    }
}

/// Two providers are equal when they share the same session state.
impl<B> PartialEq for SessionProvider<B> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<B: AuthBackend + DocumentStore> SessionProvider<B> {
    /// Starts from whatever account the backend already has signed in, then
    /// follows the backend's auth changes.
    pub fn new(backend: B) -> Self {
        let user = backend.current_account().map(|a| User::from_account(&a));
        let shared = Rc::new(Shared {
            user: RefCell::new(user),
            ..Default::default()
        });

        let weak = Rc::downgrade(&shared);
        let watch = backend.on_auth_state_change(move |account| {
            if let Some(shared) = weak.upgrade() {
                shared.follow(account);
            }
        });
        *shared._backend_watch.borrow_mut() = Some(watch);

        Self { backend, shared }
    }

    pub fn current_user(&self) -> Option<User> {
        self.shared.user.borrow().clone()
    }

    /// Register `listener`. It is called once right away with the current value,
    /// then after every change until the subscription is dropped.
    pub fn on_change(&self, listener: impl Fn(Option<&User>) + 'static) -> Subscription {
        let listener: Listener = Rc::new(listener);
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);
        self.shared
            .listeners
            .borrow_mut()
            .push((id, listener.clone()));

        let current = self.current_user();
        listener(current.as_ref());

        Subscription {
            id,
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Create an account with a profile and sign it in.
    pub async fn sign_up(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        validate_signup(first_name, last_name, email, password)?;
        let _driving = Driving::start(&self.shared);

        let account = self.backend.sign_up(email.trim(), password).await?;
        let user = User {
            id: account.uid.clone(),
            display_name: format!("{} {}", first_name.trim(), last_name.trim()),
            email: account.email.clone(),
            bio: None,
        };

        if let Err(e) = self.create_profile(&user).await {
            tracing::warn!(uid = %user.id, "signup incomplete, removing credential: {e}");
            if let Err(rollback) = self.backend.delete_account().await {
                tracing::error!(uid = %user.id, "could not remove credential: {rollback}");
                self.backend.sign_out().await;
            }
            return Err(e.into());
        }

        tracing::info!(uid = %user.id, "signed up");
        let id = user.id.clone();
        self.shared.set_user(Some(user));
        Ok(id)
    }

    async fn create_profile(&self, user: &User) -> Result<(), BackendError> {
        self.backend.update_display_name(&user.display_name).await?;
        let record =
            serde_json::to_value(user.to_record()).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.backend.write(&user_path(&user.id), record).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let _driving = Driving::start(&self.shared);
        let account = self.backend.sign_in(email.trim(), password).await?;
        let user = self.profile_for(&account).await;
        tracing::info!(uid = %user.id, "signed in");
        self.shared.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Stored profile of `account`, or one derived from the account alone.
    async fn profile_for(&self, account: &AuthAccount) -> User {
        let fallback = || User::from_account(account);
        match self.backend.read(&user_path(&account.uid)).await {
            Ok(Some(value)) => User::decode(account.uid.as_str(), value).unwrap_or_else(|e| {
                tracing::warn!("unreadable profile: {e}");
                fallback()
            }),
            Ok(None) => fallback(),
            Err(e) => {
                tracing::warn!(uid = %account.uid, "could not load profile: {e}");
                fallback()
            }
        }
    }

    pub async fn sign_out(&self) {
        let _driving = Driving::start(&self.shared);
        self.backend.sign_out().await;
        if let Some(user) = self.current_user() {
            tracing::info!(uid = %user.id, "signed out");
        }
        self.shared.set_user(None);
    }

    pub async fn change_password(&self, new_password: &str) -> Result<(), AuthError> {
        if self.current_user().is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        if new_password.is_empty() {
            return Err(AuthError::Invalid("Enter a new password.".to_string()));
        }
        self.backend.update_password(new_password).await?;
        tracing::info!("password changed");
        Ok(())
    }

    /// Replace the signed-in user's display name and bio. A blank bio clears it.
    pub async fn update_profile(&self, display_name: &str, bio: &str) -> Result<User, AuthError> {
        let Some(mut user) = self.current_user() else {
            return Err(AuthError::NotAuthenticated);
        };
        let name = display_name.trim();
        if name.is_empty() {
            return Err(AuthError::Invalid("Name cannot be empty.".to_string()));
        }
        let bio = bio.trim();

        user.display_name = name.to_string();
        user.bio = (!bio.is_empty()).then(|| bio.to_string());

        self.backend.update_display_name(name).await?;
        let record =
            serde_json::to_value(user.to_record()).map_err(|e| AuthError::Rejected(e.to_string()))?;
        self.backend.write(&user_path(&user.id), record).await?;

        tracing::info!(uid = %user.id, "profile updated");
        self.shared.set_user(Some(user.clone()));
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use store::MemoryBackend;

    use super::*;

    type Seen = Rc<RefCell<Vec<Option<String>>>>;

    fn record(session: &SessionProvider<MemoryBackend>) -> (Seen, Subscription) {
        let seen: Seen = Rc::default();
        let sink = seen.clone();
        let sub = session.on_change(move |u| sink.borrow_mut().push(u.map(|u| u.email.clone())));
        (seen, sub)
    }

    async fn signed_up(backend: &MemoryBackend) -> SessionProvider<MemoryBackend> {
        let session = SessionProvider::new(backend.clone());
        session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password1")
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_and_session() {
        let backend = MemoryBackend::new();
        let session = SessionProvider::new(backend.clone());
        let (seen, _sub) = record(&session);

        let uid = session
            .sign_up("Ada", "Lovelace", "a@x.com", "12345678")
            .await
            .unwrap();

        let user = session.current_user().unwrap();
        assert_eq!(user.id, uid);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.display_name, "Ada Lovelace");

        let profile = backend.read(&user_path(&uid)).await.unwrap().unwrap();
        assert_eq!(
            profile,
            json!({ "name": "Ada Lovelace", "email": "a@x.com", "userId": uid.as_str() })
        );
        assert_eq!(backend.current_account().unwrap().display_name.as_deref(), Some("Ada Lovelace"));

        assert_eq!(*seen.borrow(), vec![None, Some("a@x.com".to_string())]);
    }

    #[tokio::test]
    async fn test_sign_up_form_checks() {
        let backend = MemoryBackend::new();
        let session = SessionProvider::new(backend.clone());

        let err = session
            .sign_up("Al", "Lovelace", "a@x.com", "12345678")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));

        let err = session
            .sign_up("Ada", "Lovelace", "a@x.com", "1234567")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));

        assert!(!backend.has_account("a@x.com"));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let backend = MemoryBackend::new();
        let session = signed_up(&backend).await;
        session.sign_out().await;

        let err = session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password2")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::Rejected("The email address is already in use by another account.".to_string())
        );
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rolls_back_without_profile() {
        let backend = MemoryBackend::new();
        backend.set_store_offline(true);
        let session = SessionProvider::new(backend.clone());
        let (seen, _sub) = record(&session);

        let err = session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password1")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Rejected("backend unavailable".to_string()));

        assert!(!backend.has_account("ada@x.com"));
        assert!(backend.current_account().is_none());
        assert!(session.current_user().is_none());
        assert_eq!(*seen.borrow(), vec![None]);
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile() {
        let backend = MemoryBackend::new();
        let session = signed_up(&backend).await;
        let uid = session.current_user().unwrap().id;
        backend
            .update(&user_path(&uid), json!({ "bio": "First programmer" }))
            .await
            .unwrap();
        session.sign_out().await;

        let user = session.sign_in("ada@x.com", "password1").await.unwrap();
        assert_eq!(user.display_name, "Ada Lovelace");
        assert_eq!(user.bio.as_deref(), Some("First programmer"));
        assert_eq!(session.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_sign_in_without_profile_uses_account() {
        let backend = MemoryBackend::new();
        backend.sign_up("bare@x.com", "password1").await.unwrap();
        backend.sign_out().await;

        let session = SessionProvider::new(backend);
        let user = session.sign_in("bare@x.com", "password1").await.unwrap();
        assert_eq!(user.display_name, "bare@x.com");
        assert!(user.bio.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials() {
        let backend = MemoryBackend::new();
        let session = signed_up(&backend).await;
        session.sign_out().await;

        let err = session.sign_in("ada@x.com", "wrong-password").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password.");
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_listener_sequence_and_unsubscribe() {
        let backend = MemoryBackend::new();
        let session = signed_up(&backend).await;
        session.sign_out().await;

        let (seen, sub) = record(&session);
        session.sign_in("ada@x.com", "password1").await.unwrap();
        session.sign_out().await;
        sub.unsubscribe();
        session.sign_in("ada@x.com", "password1").await.unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![None, Some("ada@x.com".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_notifications() {
        let backend = MemoryBackend::new();
        let session = SessionProvider::new(backend);
        let (seen, sub) = record(&session);
        drop(sub);

        session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password1")
            .await
            .unwrap();
        assert_eq!(*seen.borrow(), vec![None]);
    }

    #[tokio::test]
    async fn test_unsubscribe_inside_listener() {
        let backend = MemoryBackend::new();
        let session = SessionProvider::new(backend);
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::default();
        let calls = Rc::new(Cell::new(0));

        let inner_slot = slot.clone();
        let inner_calls = calls.clone();
        let sub = session.on_change(move |user| {
            inner_calls.set(inner_calls.get() + 1);
            if user.is_some() {
                inner_slot.borrow_mut().take();
            }
        });
        *slot.borrow_mut() = Some(sub);

        session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password1")
            .await
            .unwrap();
        session.sign_out().await;

        assert_eq!(calls.get(), 2);
        assert!(slot.borrow().is_none());
    }

    #[tokio::test]
    async fn test_subscription_outlives_provider() {
        let session = SessionProvider::new(MemoryBackend::new());
        let sub = session.on_change(|_| {});
        drop(session);
        drop(sub);
    }

    #[tokio::test]
    async fn test_backend_sign_out_ends_session() {
        let backend = MemoryBackend::new();
        let session = signed_up(&backend).await;
        let (seen, _sub) = record(&session);

        // The auth service drops the credential on its own.
        backend.clone().sign_out().await;

        assert!(backend.current_account().is_none());
        assert!(session.current_user().is_none());
        assert_eq!(*seen.borrow(), vec![Some("ada@x.com".to_string()), None]);
    }

    #[tokio::test]
    async fn test_backend_sign_in_starts_session() {
        let backend = MemoryBackend::new();
        backend.sign_up("ada@x.com", "password1").await.unwrap();
        backend.sign_out().await;

        let session = SessionProvider::new(backend.clone());
        let (seen, _sub) = record(&session);
        backend.sign_in("ada@x.com", "password1").await.unwrap();

        assert_eq!(session.current_user().unwrap().email, "ada@x.com");
        assert_eq!(*seen.borrow(), vec![None, Some("ada@x.com".to_string())]);
    }

    #[tokio::test]
    async fn test_backend_outlives_provider() {
        let backend = MemoryBackend::new();
        drop(SessionProvider::new(backend.clone()));
        backend.sign_up("ada@x.com", "password1").await.unwrap();
        backend.sign_out().await;
    }

    #[tokio::test]
    async fn test_existing_account_is_restored() {
        let backend = MemoryBackend::new();
        backend.sign_up("ada@x.com", "password1").await.unwrap();

        let session = SessionProvider::new(backend);
        assert_eq!(session.current_user().unwrap().email, "ada@x.com");
    }

    #[tokio::test]
    async fn test_change_password() {
        let backend = MemoryBackend::new();
        let session = SessionProvider::new(backend.clone());
        assert_eq!(
            session.change_password("newpassword").await.unwrap_err(),
            AuthError::NotAuthenticated
        );

        session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password1")
            .await
            .unwrap();
        assert!(matches!(
            session.change_password("").await.unwrap_err(),
            AuthError::Invalid(_)
        ));
        session.change_password("newpassword").await.unwrap();

        session.sign_out().await;
        assert!(session.sign_in("ada@x.com", "password1").await.is_err());
        session.sign_in("ada@x.com", "newpassword").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_profile() {
        let backend = MemoryBackend::new();
        let session = SessionProvider::new(backend.clone());
        assert_eq!(
            session.update_profile("Ada", "").await.unwrap_err(),
            AuthError::NotAuthenticated
        );

        session
            .sign_up("Ada", "Lovelace", "ada@x.com", "password1")
            .await
            .unwrap();
        let (seen, _sub) = record(&session);

        let user = session
            .update_profile("  Countess Lovelace ", " Wrote the first program ")
            .await
            .unwrap();
        assert_eq!(user.display_name, "Countess Lovelace");
        assert_eq!(user.bio.as_deref(), Some("Wrote the first program"));
        assert_eq!(session.current_user(), Some(user.clone()));
        assert_eq!(seen.borrow().len(), 2);

        let stored = User::decode(user.id.as_str(), backend.read(&user_path(&user.id)).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, user);

        let cleared = session.update_profile("Countess Lovelace", "  ").await.unwrap();
        assert!(cleared.bio.is_none());

        assert!(matches!(
            session.update_profile("   ", "bio").await.unwrap_err(),
            AuthError::Invalid(_)
        ));
    }
}
