//! Authentication-state change notifications.
//!
//! Provider implementations own an [`AuthStateBroadcaster`] and publish the
//! signed-in user record on every change. Consumers hold an
//! [`AuthStateSubscription`]; dropping it (or calling
//! [`AuthStateSubscription::unsubscribe`]) releases the registration.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::model::AuthUser;

/// One emission: the signed-in user, or `None` when signed out.
pub type AuthStateEvent = Option<AuthUser>;

/// A live registration on an identity provider's state stream.
pub struct AuthStateSubscription {
    receiver: mpsc::UnboundedReceiver<AuthStateEvent>,
    token: CancellationToken,
}

impl AuthStateSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<AuthStateEvent>, token: CancellationToken) -> Self {
        Self { receiver, token }
    }

    /// Waits for the next emission.
    ///
    /// Returns `None` once the subscription is released or the provider
    /// goes away.
    pub async fn next(&mut self) -> Option<AuthStateEvent> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            event = self.receiver.recv() => event,
        }
    }

    /// Releases the registration. Idempotent.
    pub fn unsubscribe(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for AuthStateSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for AuthStateSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStateSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct Subscriber {
    sender: mpsc::UnboundedSender<AuthStateEvent>,
    token: CancellationToken,
}

#[derive(Default)]
struct BroadcasterState {
    /// `None` until the provider has determined whether anyone is signed in.
    current: Option<AuthStateEvent>,
    subscribers: Vec<Subscriber>,
}

impl BroadcasterState {
    fn prune(&mut self) {
        self.subscribers
            .retain(|s| !s.token.is_cancelled() && !s.sender.is_closed());
    }
}

/// Fan-out of auth-state emissions to every live subscription.
///
/// New subscribers receive the current state immediately once it has been
/// determined, then every later emission in publish order.
#[derive(Default)]
pub struct AuthStateBroadcaster {
    state: Mutex<BroadcasterState>,
}

impl AuthStateBroadcaster {
    /// Creates a broadcaster whose initial state is not yet known.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broadcaster that already knows the initial state.
    pub fn determined(initial: AuthStateEvent) -> Self {
        Self {
            state: Mutex::new(BroadcasterState {
                current: Some(initial),
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BroadcasterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> AuthStateSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let mut state = self.lock();
        state.prune();
        if let Some(current) = &state.current {
            // Receiver is alive in this scope, so the send cannot fail.
            let _ = sender.send(current.clone());
        }
        state.subscribers.push(Subscriber {
            sender,
            token: token.clone(),
        });
        tracing::debug!(
            "[AuthState] Subscription registered ({} active)",
            state.subscribers.len()
        );

        AuthStateSubscription::new(receiver, token)
    }

    /// Records `event` as the current state and delivers it to subscribers.
    pub fn publish(&self, event: AuthStateEvent) {
        let mut state = self.lock();
        state.current = Some(event.clone());
        state
            .subscribers
            .retain(|s| !s.token.is_cancelled() && s.sender.send(event.clone()).is_ok());
    }

    /// The signed-in user, if the state is determined and someone is signed in.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.lock().current.clone().flatten()
    }

    pub fn is_determined(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.prune();
        state.subscribers.len()
    }
}
