//! SessionStore - single owner of "who is signed in".
//!
//! The store subscribes once to the identity provider's auth-state stream and
//! mirrors every emission into a [`watch`] channel. It is the only writer of
//! that channel: account operations ask the provider to change state and the
//! change comes back through the subscription.

use std::sync::{Arc, Mutex, PoisonError};

use motio_core::user::{
    AuthStateSubscription, EmailCredential, IdentityProvider, Persistence, ProfileUpdate,
    Session, SessionState, validate_email,
};
use motio_core::{MotioError, Result};
use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::password::ChangePasswordForm;

pub struct SessionStore {
    identity: Arc<dyn IdentityProvider>,
    persistence: Persistence,
    state: Arc<watch::Sender<SessionState>>,
    init: OnceCell<()>,
    /// Cancelled on shutdown, or by the listener itself when its stream ends.
    listener: CancellationToken,
    listener_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            identity,
            persistence: Persistence::default(),
            state: Arc::new(state),
            init: OnceCell::new(),
            listener: CancellationToken::new(),
            listener_task: Mutex::new(None),
        }
    }

    /// Persistence mode selected before every sign-in.
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = persistence;
        self
    }

    /// Subscribes to the provider (once per store) and waits for its first
    /// emission.
    ///
    /// Concurrent callers share the same subscription and all resolve to the
    /// same determined state.
    pub async fn initialize(&self) -> Result<Session> {
        self.init.get_or_init(|| self.start_listener()).await;
        let state = self.wait_for(SessionState::is_initialized).await?;
        Ok(state.session())
    }

    async fn start_listener(&self) {
        tracing::debug!("[SessionStore] Subscribing to auth state");
        self.state.send_replace(SessionState::Initializing);

        let subscription = self.identity.on_auth_state_changed();
        let handle = tokio::spawn(forward_auth_state(
            subscription,
            Arc::clone(&self.state),
            self.listener.clone(),
        ));
        *self
            .listener_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Current snapshot. `initialized` is false until [`initialize`](Self::initialize)
    /// has seen the provider's first emission.
    pub fn session(&self) -> Session {
        self.state.borrow().session()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Change stream of the session state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Waits until the store reflects the provider's latest emission.
    pub async fn settled(&self) -> Result<Session> {
        self.initialize().await?;
        let identity = Arc::clone(&self.identity);
        let state = self
            .wait_for(move |state| {
                state.is_initialized() && state.current_user() == identity.current_user().as_ref()
            })
            .await?;
        Ok(state.session())
    }

    /// Creates an account, signs it in and sets its display name.
    ///
    /// Returns once the store shows the new user with that name.
    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<()> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(MotioError::validation("password", "Password must not be empty."));
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(MotioError::validation(
                "displayName",
                "Display name must not be empty.",
            ));
        }

        self.initialize().await?;
        let user = self.identity.create_account(email.trim(), password).await?;
        let update = ProfileUpdate::new().with_display_name(display_name);
        if let Err(e) = self.identity.set_profile(&user, &update).await {
            tracing::warn!("[SessionStore] Profile setup failed, signing out: {}", e);
            if let Err(e) = self.identity.sign_out().await {
                tracing::warn!("[SessionStore] Sign-out after failed sign-up failed: {}", e);
            }
            self.settled().await?;
            return Err(e.into());
        }
        self.settled().await?;

        tracing::info!("[SessionStore] Account created: {}", user.uid);
        Ok(())
    }

    /// Signs in with the configured persistence mode.
    ///
    /// Resolves on the provider's acknowledgment. The user appears in
    /// [`session`](Self::session) once the provider's notification arrives.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.initialize().await?;
        self.identity.set_persistence(self.persistence).await?;
        self.identity.sign_in(email.trim(), password).await?;
        tracing::info!("[SessionStore] Sign-in accepted");
        Ok(())
    }

    /// Ends the current session. A no-op when nobody is signed in.
    pub async fn sign_out(&self) -> Result<()> {
        self.initialize().await?;
        self.identity.sign_out().await?;
        tracing::info!("[SessionStore] Signed out");
        Ok(())
    }

    /// Sets the display name and sets (or, with `None`, clears) the avatar.
    pub async fn update_user(&self, display_name: &str, photo_url: Option<String>) -> Result<()> {
        let session = self.initialize().await?;
        let user = session.current_user.ok_or(MotioError::NoSession)?;

        let update = ProfileUpdate::new()
            .with_display_name(display_name)
            .with_photo_url(photo_url);
        self.identity.set_profile(&user, &update).await?;
        self.settled().await?;

        tracing::info!("[SessionStore] Profile updated: {}", user.uid);
        Ok(())
    }

    /// Re-authenticates with the current password, then sets the new one.
    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<()> {
        let session = self.initialize().await?;
        let user = session.current_user.ok_or(MotioError::NoSession)?;
        let email = user
            .email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or(MotioError::NoSession)?;
        form.validate()?;

        let credential = EmailCredential::new(email, form.current_password.as_str());
        self.identity.reauthenticate(&user, &credential).await?;
        self.identity
            .change_password(&user, &form.new_password)
            .await?;

        tracing::info!("[SessionStore] Password changed: {}", user.uid);
        Ok(())
    }

    /// Whether auth-state changes are still being mirrored.
    pub fn is_listening(&self) -> bool {
        self.listener_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
            && !self.listener.is_cancelled()
    }

    /// Releases the auth-state subscription and waits for the listener to stop.
    pub async fn shutdown(&self) {
        self.listener.cancel();
        let handle = self
            .listener_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("[SessionStore] Auth state listener failed: {}", e);
            }
        }
    }

    async fn wait_for(
        &self,
        mut ready: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState> {
        let mut receiver = self.state.subscribe();
        tokio::select! {
            biased;
            state = receiver.wait_for(|state| ready(state)) => state
                .map(|state| SessionState::clone(&state))
                .map_err(|_| MotioError::internal("session state channel closed")),
            _ = self.listener.cancelled() => {
                Err(MotioError::internal("auth state listener has stopped"))
            }
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.listener.cancel();
    }
}

async fn forward_auth_state(
    mut subscription: AuthStateSubscription,
    state: Arc<watch::Sender<SessionState>>,
    stop: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = stop.cancelled() => break,
            event = subscription.next() => event,
        };
        let Some(user) = event else {
            tracing::warn!("[SessionStore] Auth state stream ended");
            break;
        };

        tracing::debug!(
            "[SessionStore] Auth state: {}",
            user.as_ref().map_or("signed out", |u| u.uid.as_str())
        );
        state.send_replace(SessionState::from_event(user));
    }

    subscription.unsubscribe();
    stop.cancel();
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
