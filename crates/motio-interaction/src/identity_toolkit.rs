//! IdentityToolkitClient - email/password accounts over the Identity Toolkit
//! REST API.
//!
//! The client owns the id/refresh token pair and is the only writer of the
//! auth state it broadcasts. With [`Persistence::Local`] the signed-in
//! session is mirrored to a [`SessionStorage`] and restored by
//! [`IdentityToolkitClient::connect`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use motio_core::config::IdentitySettings;
use motio_core::user::{
    AuthStateBroadcaster, AuthStateSubscription, AuthUser, EmailCredential, IdentityProvider,
    PersistedSession, Persistence, ProfileUpdate, SessionStorage,
};
use motio_core::{AuthError, AuthErrorReason};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Tokens are refreshed when they expire within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
const USER_MISMATCH: &str = "auth/user-mismatch";

pub struct IdentityToolkitClient {
    client: Client,
    api_key: String,
    endpoint: String,
    token_endpoint: String,
    storage: Option<Arc<dyn SessionStorage>>,
    persistence: Mutex<Persistence>,
    session: Mutex<Option<PersistedSession>>,
    broadcaster: AuthStateBroadcaster,
}

impl IdentityToolkitClient {
    /// Creates the client and determines the initial auth state.
    ///
    /// With local persistence a stored session is restored (refreshing its
    /// token if needed). Storage or refresh failures leave the client signed
    /// out rather than failing startup.
    pub async fn connect(
        api_key: impl Into<String>,
        settings: &IdentitySettings,
        storage: Option<Arc<dyn SessionStorage>>,
    ) -> Self {
        let client = Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            token_endpoint: settings.token_endpoint.trim_end_matches('/').to_string(),
            storage,
            persistence: Mutex::new(settings.persistence),
            session: Mutex::new(None),
            broadcaster: AuthStateBroadcaster::new(),
        };

        let restored = client.restore().await;
        if let Some(session) = &restored {
            tracing::info!("[IdentityToolkit] Restored session for {}", session.user.uid);
        }
        let user = restored.as_ref().map(|s| s.user.clone());
        *lock(&client.session) = restored;
        client.broadcaster.publish(user);
        client
    }

    async fn restore(&self) -> Option<PersistedSession> {
        if self.persistence() != Persistence::Local {
            return None;
        }
        let storage = self.storage.as_ref()?;
        let stored = match storage.load().await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!("[IdentityToolkit] Failed to load stored session: {}", e);
                return None;
            }
        };

        if !stored.needs_refresh(Utc::now(), REFRESH_MARGIN_SECS) {
            return Some(stored);
        }
        match self.refresh(&stored).await {
            Ok(refreshed) => {
                self.persist(&refreshed).await;
                Some(refreshed)
            }
            Err(e) => {
                tracing::warn!("[IdentityToolkit] Stored session could not be refreshed: {}", e);
                if let Err(e) = storage.clear().await {
                    tracing::warn!("[IdentityToolkit] Failed to clear stored session: {}", e);
                }
                None
            }
        }
    }

    fn persistence(&self) -> Persistence {
        *lock(&self.persistence)
    }

    fn account_url(&self, method: &str) -> String {
        format!("{}/accounts:{method}?key={}", self.endpoint, self.api_key)
    }

    async fn post<B, R>(&self, url: String, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::network(e.to_string()))?;
        read_response(response).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.post(
            self.account_url("signInWithPassword"),
            &PasswordBody {
                email,
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    async fn lookup(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        let response: LookupResponse = self
            .post(self.account_url("lookup"), &LookupBody { id_token })
            .await?;
        response
            .users
            .into_iter()
            .next()
            .map(AccountInfo::into_user)
            .ok_or_else(|| AuthError::new(AuthErrorReason::UserNotFound))
    }

    async fn refresh(&self, session: &PersistedSession) -> Result<PersistedSession, AuthError> {
        tracing::debug!("[IdentityToolkit] Refreshing id token");
        let response = self
            .client
            .post(format!("{}/token?key={}", self.token_endpoint, self.api_key))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::network(e.to_string()))?;
        let refreshed: RefreshResponse = read_response(response).await?;

        if refreshed.user_id != session.user.uid {
            return Err(AuthError::new(AuthErrorReason::Other(USER_MISMATCH.into())));
        }
        Ok(PersistedSession {
            user: session.user.clone(),
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: expires_at(Utc::now(), refreshed.expires_in.as_deref()),
        })
    }

    /// The signed-in session for `user` with a usable id token.
    async fn active_session(&self, user: &AuthUser) -> Result<PersistedSession, AuthError> {
        let session = lock(&self.session)
            .clone()
            .ok_or_else(|| AuthError::new(AuthErrorReason::SessionExpired))?;
        if session.user.uid != user.uid {
            return Err(AuthError::new(AuthErrorReason::Other(USER_MISMATCH.into())));
        }
        if !session.needs_refresh(Utc::now(), REFRESH_MARGIN_SECS) {
            return Ok(session);
        }
        let refreshed = self.refresh(&session).await?;
        self.replace_tokens(&refreshed).await;
        Ok(refreshed)
    }

    async fn persist(&self, session: &PersistedSession) {
        if self.persistence() != Persistence::Local {
            return;
        }
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(session).await {
                tracing::warn!("[IdentityToolkit] Failed to store session: {}", e);
            }
        }
    }

    /// Installs a session for a changed user record and notifies subscribers.
    async fn install(&self, session: PersistedSession) {
        self.persist(&session).await;
        let user = session.user.clone();
        *lock(&self.session) = Some(session);
        self.broadcaster.publish(Some(user));
    }

    /// Swaps tokens without touching the user record, so nothing is emitted.
    async fn replace_tokens(&self, session: &PersistedSession) {
        self.persist(session).await;
        *lock(&self.session) = Some(session.clone());
    }
}

#[async_trait::async_trait]
impl IdentityProvider for IdentityToolkitClient {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let tokens: TokenResponse = self
            .post(
                self.account_url("signUp"),
                &PasswordBody {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let session = tokens.into_session(Utc::now());
        let user = session.user.clone();
        tracing::info!("[IdentityToolkit] Account created: {}", user.uid);
        self.install(session).await;
        Ok(user)
    }

    async fn set_profile(
        &self,
        user: &AuthUser,
        update: &ProfileUpdate,
    ) -> Result<AuthUser, AuthError> {
        let session = self.active_session(user).await?;
        let body = UpdateAccountBody::profile(&session.id_token, update);
        let response: UpdateResponse = self.post(self.account_url("update"), &body).await?;

        let mut updated = session.user.with_profile(update);
        if let Some(name) = response.display_name {
            updated.display_name = Some(name);
        }
        if response.photo_url.is_some() {
            updated.photo_url = response.photo_url;
        }

        let now = Utc::now();
        let next = PersistedSession {
            user: updated.clone(),
            id_token: response.id_token.unwrap_or(session.id_token),
            refresh_token: response.refresh_token.unwrap_or(session.refresh_token),
            expires_at: match response.expires_in.as_deref() {
                Some(secs) => expires_at(now, Some(secs)),
                None => session.expires_at,
            },
        };
        tracing::info!("[IdentityToolkit] Profile updated for {}", updated.uid);
        self.install(next).await;
        Ok(updated)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let tokens = self.sign_in_with_password(email, password).await?;
        let mut session = tokens.into_session(Utc::now());

        match self.lookup(&session.id_token).await {
            Ok(user) => session.user = user,
            Err(e) => tracing::warn!("[IdentityToolkit] Profile lookup failed after sign-in: {}", e),
        }
        tracing::info!("[IdentityToolkit] Signed in: {}", session.user.uid);
        self.install(session).await;
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = lock(&self.session).take();
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.clear().await {
                tracing::warn!("[IdentityToolkit] Failed to clear stored session: {}", e);
            }
        }
        if let Some(session) = previous {
            tracing::info!("[IdentityToolkit] Signed out: {}", session.user.uid);
            self.broadcaster.publish(None);
        }
        Ok(())
    }

    async fn reauthenticate(
        &self,
        user: &AuthUser,
        credential: &EmailCredential,
    ) -> Result<(), AuthError> {
        let tokens = self
            .sign_in_with_password(&credential.email, &credential.password)
            .await?;
        if tokens.local_id != user.uid {
            return Err(AuthError::new(AuthErrorReason::Other(USER_MISMATCH.into())));
        }

        let fresh = tokens.into_session(Utc::now());
        let current = lock(&self.session).clone();
        if let Some(current) = current.filter(|s| s.user.uid == user.uid) {
            self.replace_tokens(&PersistedSession {
                user: current.user,
                ..fresh
            })
            .await;
        }
        Ok(())
    }

    async fn change_password(&self, user: &AuthUser, new_password: &str) -> Result<(), AuthError> {
        let session = self.active_session(user).await?;
        let body = UpdateAccountBody::password(&session.id_token, new_password);
        let response: UpdateResponse = self.post(self.account_url("update"), &body).await?;

        // Changing the password revokes the old tokens and returns new ones.
        if let (Some(id_token), Some(refresh_token)) = (response.id_token, response.refresh_token) {
            self.replace_tokens(&PersistedSession {
                expires_at: expires_at(Utc::now(), response.expires_in.as_deref()),
                user: session.user,
                id_token,
                refresh_token,
            })
            .await;
        }
        tracing::info!("[IdentityToolkit] Password changed for {}", user.uid);
        Ok(())
    }

    async fn set_persistence(&self, persistence: Persistence) -> Result<(), AuthError> {
        *lock(&self.persistence) = persistence;
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        match persistence {
            Persistence::Session => {
                if let Err(e) = storage.clear().await {
                    tracing::warn!("[IdentityToolkit] Failed to clear stored session: {}", e);
                }
            }
            Persistence::Local => {
                let current = lock(&self.session).clone();
                if let Some(session) = current {
                    self.persist(&session).await;
                }
            }
        }
        Ok(())
    }

    fn on_auth_state_changed(&self) -> AuthStateSubscription {
        self.broadcaster.subscribe()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.broadcaster.current_user()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn read_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, AuthError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AuthError::network(e.to_string()))?;

    if !status.is_success() {
        return Err(parse_error_body(status, &text));
    }
    serde_json::from_str(&text).map_err(|e| {
        AuthError::new(AuthErrorReason::Other("auth/invalid-response".into()))
            .with_message(format!("Unexpected identity service response: {e}"))
    })
}

/// Maps `{"error":{"message":"EMAIL_EXISTS"}}` style bodies to an [`AuthError`].
fn parse_error_body(status: StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper.error.message;
            AuthError::new(AuthErrorReason::from_provider_code(&message)).with_message(message)
        }
        Err(_) => AuthError::new(AuthErrorReason::Other(format!("http-{}", status.as_u16())))
            .with_message(format!("Identity service returned HTTP {}", status.as_u16())),
    }
}

/// `expiresIn` arrives as a decimal string of seconds.
fn expires_at(now: DateTime<Utc>, expires_in: Option<&str>) -> DateTime<Utc> {
    let default = now + chrono::Duration::seconds(DEFAULT_EXPIRES_IN_SECS);
    expires_in
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(chrono::Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(default)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordBody<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupBody<'a> {
    id_token: &'a str,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountBody<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    delete_attribute: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    return_secure_token: bool,
}

impl<'a> UpdateAccountBody<'a> {
    fn profile(id_token: &'a str, update: &'a ProfileUpdate) -> Self {
        let (photo_url, delete_attribute) = match &update.photo_url {
            Some(Some(url)) => (Some(url.as_str()), Vec::new()),
            Some(None) => (None, vec!["PHOTO_URL"]),
            None => (None, Vec::new()),
        };
        Self {
            id_token,
            display_name: update.display_name.as_deref(),
            photo_url,
            delete_attribute,
            password: None,
            return_secure_token: true,
        }
    }

    fn password(id_token: &'a str, password: &'a str) -> Self {
        Self {
            id_token,
            display_name: None,
            photo_url: None,
            delete_attribute: Vec::new(),
            password: Some(password),
            return_secure_token: true,
        }
    }
}

/// Response of `signUp` and `signInWithPassword`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    profile_picture: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> PersistedSession {
        PersistedSession {
            user: AuthUser {
                uid: self.local_id,
                email: self.email,
                display_name: self.display_name.filter(|n| !n.is_empty()),
                photo_url: self.profile_picture.filter(|p| !p.is_empty()),
            },
            expires_at: expires_at(now, self.expires_in.as_deref()),
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl AccountInfo {
    fn into_user(self) -> AuthUser {
        AuthUser {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name,
            photo_url: self.photo_url,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    display_name: Option<String>,
    photo_url: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

/// The token endpoint answers in snake_case.
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
    user_id: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}
