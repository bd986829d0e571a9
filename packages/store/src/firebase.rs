//! # Firebase backend: Auth and Realtime Database over REST
//!
//! [`FirebaseBackend`] implements [`AuthBackend`] and [`DocumentStore`] against a
//! Firebase project using its public REST endpoints, so the same code runs natively
//! and in the browser (`reqwest` uses `fetch` on wasm).
//!
//! ## Auth (Identity Toolkit)
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | sign up | `accounts:signUp` |
//! | sign in | `accounts:signInWithPassword` |
//! | display name / password | `accounts:update` |
//! | delete account | `accounts:delete` |
//! | token refresh | `securetoken.googleapis.com/v1/token` |
//!
//! The signed-in credential (ID token, refresh token, expiry) lives in the backend
//! value and is shared by clones. An ID token that expires within
//! [`REFRESH_MARGIN_SECS`] is refreshed before the next database request.
//!
//! The account and refresh token are kept in a [`TokenStore`], so a backend built
//! with [`FirebaseBackend::with_token_store`] starts out signed in as whoever was
//! signed in last time. The restored credential has no ID token yet; the first
//! request refreshes it, and a refresh the service rejects signs the account out.
//!
//! Every sign-in or sign-out starts a new credential generation. Work that awaited
//! the network with an older generation (a token refresh racing a logout) does not
//! write its result back.
//!
//! ## Realtime Database
//!
//! Each document path maps to `{database_url}/{path}.json`. Reads are `GET`,
//! writes `PUT`, pushes `POST` (the response names the generated key), updates
//! `PATCH`, removes `DELETE`. Queries use `orderBy="field"&equalTo="value"`, which
//! needs an `.indexOn` rule for the field in the database rules. The ID token is
//! passed as the `auth` query parameter when signed in.
//!
//! ## Errors
//!
//! Identity Toolkit failures come back as `{"error":{"message":"CODE : detail"}}`
//! and are turned into [`BackendError::Auth`] with a readable message
//! ([`auth_error`]). Database failures (`{"error":"Permission denied"}`) become
//! [`BackendError::Status`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::{children, AuthBackend, BackendError, DocumentStore};
use crate::config::BackendConfig;
use crate::models::{AuthAccount, UserId};
use crate::token_store::{MemoryTokenStore, SavedSession, TokenStore};
use crate::watch::{AuthListeners, AuthWatch};

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Refresh an ID token this many seconds before it expires.
pub const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Clone, Debug)]
struct Credentials {
    account: AuthAccount,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Credential rebuilt from a saved session. Its ID token must be refreshed
    /// before use.
    fn restored(saved: SavedSession) -> Self {
        Self {
            account: saved.account,
            id_token: String::new(),
            refresh_token: saved.refresh_token,
            expires_at: Utc::now(),
        }
    }

    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) <= now
    }

    fn saved(&self) -> SavedSession {
        SavedSession {
            account: self.account.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct SignedIn {
    credentials: Option<Credentials>,
    generation: u64,
}

/// Identity Toolkit account response (`signUp`, `signInWithPassword`, `update`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

/// Secure Token refresh response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

fn expiry(expires_in: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, BackendError> {
    let secs: i64 = expires_in
        .parse()
        .map_err(|_| BackendError::Decode(format!("bad expiresIn {expires_in:?}")))?;
    Ok(now + Duration::seconds(secs))
}

fn credentials_from(
    response: AccountResponse,
    now: DateTime<Utc>,
) -> Result<Credentials, BackendError> {
    let missing = |field: &str| BackendError::Decode(format!("account response without {field}"));
    let expires_in = response.expires_in.ok_or_else(|| missing("expiresIn"))?;
    Ok(Credentials {
        account: AuthAccount {
            uid: UserId::new(response.local_id.ok_or_else(|| missing("localId"))?),
            email: response.email.unwrap_or_default(),
            display_name: response.display_name.filter(|n| !n.is_empty()),
        },
        id_token: response.id_token.ok_or_else(|| missing("idToken"))?,
        refresh_token: response.refresh_token.ok_or_else(|| missing("refreshToken"))?,
        expires_at: expiry(&expires_in, now)?,
    })
}

/// Map an Identity Toolkit error string (`"CODE"` or `"CODE : detail"`).
pub fn auth_error(raw: &str) -> BackendError {
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };
    let message = match code {
        "EMAIL_EXISTS" => "The email address is already in use by another account.",
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password."
        }
        "INVALID_EMAIL" => "The email address is badly formatted.",
        "USER_DISABLED" => "This account has been disabled.",
        "WEAK_PASSWORD" => detail.unwrap_or("Password should be at least 6 characters."),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later.",
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => "Please log in again before changing your password.",
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "USER_NOT_FOUND" | "INVALID_REFRESH_TOKEN" => {
            "Your session has expired. Please log in again."
        }
        "OPERATION_NOT_ALLOWED" => "Password sign-in is disabled for this project.",
        other => detail.unwrap_or(other),
    };
    BackendError::auth(code, message)
}

/// Turn a non-success response body into a [`BackendError`].
pub fn error_from_body(status: u16, body: &str) -> BackendError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    match parsed.as_ref().and_then(|v| v.get("error")) {
        Some(Value::Object(error)) => match error.get("message").and_then(Value::as_str) {
            Some(message) => auth_error(message),
            None => BackendError::Status {
                status,
                message: body.to_string(),
            },
        },
        Some(Value::String(message)) => BackendError::Status {
            status,
            message: message.clone(),
        },
        _ => BackendError::Status {
            status,
            message: body.to_string(),
        },
    }
}

/// Query string for "children of a collection whose `field` equals `equals`".
pub fn equality_query(field: &str, equals: &str) -> [(&'static str, String); 2] {
    [
        ("orderBy", Value::from(field).to_string()),
        ("equalTo", Value::from(equals).to_string()),
    ]
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

async fn read_body(response: Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(error_from_body(status.as_u16(), &body))
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// REST client for a Firebase project.
#[derive(Clone, Debug)]
pub struct FirebaseBackend {
    config: Arc<BackendConfig>,
    http: reqwest::Client,
    state: Arc<Mutex<SignedIn>>,
    tokens: Arc<dyn TokenStore>,
    listeners: AuthListeners,
}

impl FirebaseBackend {
    /// Backend whose sign-in is forgotten when the process ends.
    pub fn new(config: BackendConfig) -> Self {
        Self::with_token_store(config, MemoryTokenStore::new())
    }

    /// Backend that saves its sign-in to `tokens` and resumes the saved one.
    pub fn with_token_store(config: BackendConfig, tokens: impl TokenStore + 'static) -> Self {
        let credentials = tokens.load().map(|saved| {
            tracing::debug!(uid = %saved.account.uid, "resuming saved session");
            Credentials::restored(saved)
        });
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            state: Arc::new(Mutex::new(SignedIn {
                credentials,
                generation: 0,
            })),
            tokens: Arc::new(tokens),
            listeners: AuthListeners::default(),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// URL of the REST resource for a document path.
    pub fn document_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.config.database_root(), path.trim_matches('/'))
    }

    fn credentials(&self) -> Option<Credentials> {
        self.state.lock().unwrap().credentials.clone()
    }

    /// Current credential and its generation.
    fn snapshot(&self) -> (Option<Credentials>, u64) {
        let state = self.state.lock().unwrap();
        (state.credentials.clone(), state.generation)
    }

    /// Replace the credential unconditionally.
    fn set_credentials(&self, credentials: Option<Credentials>) {
        self.swap_credentials(None, credentials);
    }

    /// Replace the credential if the generation is still `expected` (or always,
    /// when `None`). Saves the result and tells listeners when the account changed.
    /// Returns whether the credential was replaced.
    fn swap_credentials(&self, expected: Option<u64>, credentials: Option<Credentials>) -> bool {
        let (before, after, saved) = {
            let mut state = self.state.lock().unwrap();
            if expected.is_some_and(|generation| generation != state.generation) {
                return false;
            }
            let before = state.credentials.as_ref().map(|c| c.account.clone());
            state.credentials = credentials;
            state.generation += 1;
            let after = state.credentials.as_ref().map(|c| c.account.clone());
            let saved = state.credentials.as_ref().map(Credentials::saved);
            (before, after, saved)
        };
        self.tokens.save(saved.as_ref());
        if before.as_ref().map(|a| &a.uid) != after.as_ref().map(|a| &a.uid) {
            self.listeners.notify(after.as_ref());
        }
        true
    }

    async fn identity<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, BackendError> {
        tracing::debug!("identity toolkit accounts:{method}");
        let response = self
            .http
            .post(format!("{IDENTITY_URL}/accounts:{method}"))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        parse_json(&read_body(response).await?)
    }

    /// ID token of the signed-in account, refreshed when close to expiry.
    async fn id_token(&self) -> Result<Option<String>, BackendError> {
        let (credentials, generation) = self.snapshot();
        let Some(mut credentials) = credentials else {
            return Ok(None);
        };
        let now = Utc::now();
        if !credentials.needs_refresh(now) {
            return Ok(Some(credentials.id_token));
        }

        tracing::debug!(uid = %credentials.account.uid, "refreshing id token");
        let response = self
            .http
            .post(SECURE_TOKEN_URL)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": credentials.refresh_token,
            }))
            .send()
            .await
            .map_err(transport)?;
        let refreshed: RefreshResponse = match read_body(response).await {
            Ok(body) => parse_json(&body)?,
            Err(e) => {
                tracing::warn!("token refresh failed, signing out: {e}");
                self.swap_credentials(Some(generation), None);
                return Err(e);
            }
        };

        credentials.id_token = refreshed.id_token;
        credentials.refresh_token = refreshed.refresh_token;
        credentials.expires_at = expiry(&refreshed.expires_in, now)?;
        let token = credentials.id_token.clone();
        if self.swap_credentials(Some(generation), Some(credentials)) {
            Ok(Some(token))
        } else {
            tracing::debug!("session changed during token refresh, dropping refreshed token");
            Ok(self.credentials().map(|c| c.id_token))
        }
    }

    /// Credential, if it is still the one from `generation`.
    fn current_generation(&self, generation: u64) -> Option<Credentials> {
        match self.snapshot() {
            (Some(credentials), latest) if latest == generation => Some(credentials),
            _ => {
                tracing::debug!("session changed while a request was in flight");
                None
            }
        }
    }

    async fn signed_in_token(&self) -> Result<String, BackendError> {
        self.id_token().await?.ok_or(BackendError::NotSignedIn)
    }

    async fn database(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<Value, BackendError> {
        let mut request = self.http.request(method, self.document_url(path));
        if let Some(token) = self.id_token().await? {
            request = request.query(&[("auth", token)]);
        }
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let body = read_body(request.send().await.map_err(transport)?).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        parse_json(&body)
    }

    async fn start_session(&self, method: &str, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let response: AccountResponse = self
            .identity(
                method,
                json!({
                    "email": email.trim(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        let credentials = credentials_from(response, Utc::now())?;
        let account = credentials.account.clone();
        self.set_credentials(Some(credentials));
        Ok(account)
    }
}

impl AuthBackend for FirebaseBackend {
    fn current_account(&self) -> Option<AuthAccount> {
        self.credentials().map(|c| c.account)
    }

    fn on_auth_state_change(&self, listener: impl Fn(Option<&AuthAccount>) + 'static) -> AuthWatch {
        self.listeners.subscribe(listener)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        self.start_session("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        self.start_session("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) {
        self.set_credentials(None);
    }

    async fn update_display_name(&self, name: &str) -> Result<(), BackendError> {
        let token = self.signed_in_token().await?;
        let (_, generation) = self.snapshot();
        let response: AccountResponse = self
            .identity(
                "update",
                json!({
                    "idToken": token,
                    "displayName": name,
                    "returnSecureToken": false,
                }),
            )
            .await?;
        if let Some(mut credentials) = self.current_generation(generation) {
            credentials.account.display_name = response.display_name.or(Some(name.to_string()));
            self.swap_credentials(Some(generation), Some(credentials));
        }
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<(), BackendError> {
        let token = self.signed_in_token().await?;
        let (_, generation) = self.snapshot();
        let response: AccountResponse = self
            .identity(
                "update",
                json!({
                    "idToken": token,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        // A password change revokes the old tokens and returns fresh ones.
        if let Some(mut credentials) = self.current_generation(generation) {
            if let (Some(id_token), Some(refresh_token), Some(expires_in)) =
                (response.id_token, response.refresh_token, response.expires_in)
            {
                credentials.id_token = id_token;
                credentials.refresh_token = refresh_token;
                credentials.expires_at = expiry(&expires_in, Utc::now())?;
                self.swap_credentials(Some(generation), Some(credentials));
            }
        }
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), BackendError> {
        let token = self.signed_in_token().await?;
        let (_, generation) = self.snapshot();
        let _: Value = self.identity("delete", json!({ "idToken": token })).await?;
        self.swap_credentials(Some(generation), None);
        Ok(())
    }
}

impl DocumentStore for FirebaseBackend {
    async fn read(&self, path: &str) -> Result<Option<Value>, BackendError> {
        let value = self.database(Method::GET, path, None, &[]).await?;
        Ok(Some(value).filter(|v| !v.is_null()))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), BackendError> {
        self.database(Method::PUT, path, Some(&value), &[]).await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, BackendError> {
        let response = self.database(Method::POST, path, Some(&value), &[]).await?;
        let pushed: PushResponse =
            serde_json::from_value(response).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(pushed.name)
    }

    async fn update(&self, path: &str, patch: Value) -> Result<(), BackendError> {
        self.database(Method::PATCH, path, Some(&patch), &[]).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), BackendError> {
        self.database(Method::DELETE, path, None, &[]).await?;
        Ok(())
    }

    async fn query(
        &self,
        path: &str,
        field: &str,
        equals: &str,
    ) -> Result<Vec<(String, Value)>, BackendError> {
        let value = self
            .database(Method::GET, path, None, &equality_query(field, equals))
            .await?;
        Ok(children(Some(value)))
    }
}
