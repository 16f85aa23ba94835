use super::*;
use motio_core::user::{AuthStateBroadcaster, AuthUser};
use motio_core::{AuthError, AuthErrorReason};
use std::collections::HashMap;
use std::result::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

struct Account {
    user: AuthUser,
    password: String,
}

// In-memory identity provider driving a real broadcaster.
#[derive(Default)]
struct MockIdentity {
    broadcaster: AuthStateBroadcaster,
    accounts: Mutex<HashMap<String, Account>>,
    persistence: Mutex<Option<Persistence>>,
    subscriptions: AtomicUsize,
    profile_updates: AtomicUsize,
    fail_profile_updates: AtomicBool,
}

impl MockIdentity {
    /// Provider that has not yet reported whether anyone is signed in.
    fn undetermined() -> Self {
        Self::default()
    }

    fn signed_out() -> Self {
        Self {
            broadcaster: AuthStateBroadcaster::determined(None),
            ..Self::default()
        }
    }

    fn with_account(self, email: &str, password: &str, display_name: &str) -> Self {
        let mut user = AuthUser::new(format!("uid-{email}"), email);
        user.display_name = Some(display_name.to_string());
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                user,
                password: password.to_string(),
            },
        );
        self
    }

    fn check_password(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(email)
            .ok_or_else(|| AuthError::new(AuthErrorReason::UserNotFound))?;
        if account.password != password {
            return Err(AuthError::new(AuthErrorReason::WrongCredentials));
        }
        Ok(account.user.clone())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if password.len() < 6 {
            return Err(AuthError::new(AuthErrorReason::WeakPassword));
        }
        let user = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AuthError::new(AuthErrorReason::EmailAlreadyInUse));
            }
            let user = AuthUser::new(format!("uid-{email}"), email);
            accounts.insert(
                email.to_string(),
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };
        self.broadcaster.publish(Some(user.clone()));
        Ok(user)
    }

    async fn set_profile(
        &self,
        user: &AuthUser,
        update: &ProfileUpdate,
    ) -> Result<AuthUser, AuthError> {
        self.profile_updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile_updates.load(Ordering::SeqCst) {
            return Err(AuthError::network("down"));
        }
        let updated = user.with_profile(update);
        if let Some(email) = &user.email {
            if let Some(account) = self.accounts.lock().unwrap().get_mut(email) {
                account.user = updated.clone();
            }
        }
        self.broadcaster.publish(Some(updated.clone()));
        Ok(updated)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let user = self.check_password(email, password)?;
        self.broadcaster.publish(Some(user));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.broadcaster.current_user().is_some() {
            self.broadcaster.publish(None);
        }
        Ok(())
    }

    async fn reauthenticate(
        &self,
        user: &AuthUser,
        credential: &EmailCredential,
    ) -> Result<(), AuthError> {
        let account = self.check_password(&credential.email, &credential.password)?;
        if account.uid != user.uid {
            return Err(AuthError::new(AuthErrorReason::UserNotFound));
        }
        Ok(())
    }

    async fn change_password(&self, user: &AuthUser, new_password: &str) -> Result<(), AuthError> {
        let email = user.email.clone().unwrap_or_default();
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&email)
            .ok_or_else(|| AuthError::new(AuthErrorReason::UserNotFound))?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn set_persistence(&self, persistence: Persistence) -> Result<(), AuthError> {
        *self.persistence.lock().unwrap() = Some(persistence);
        Ok(())
    }

    fn on_auth_state_changed(&self) -> AuthStateSubscription {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.broadcaster.subscribe()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.broadcaster.current_user()
    }
}

fn store_with(identity: &Arc<MockIdentity>) -> SessionStore {
    SessionStore::new(Arc::clone(identity) as Arc<dyn IdentityProvider>)
}

async fn wait_until_initializing(store: &SessionStore) {
    while store.state() != SessionState::Initializing {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_initialize_waits_for_first_emission() {
    let identity = Arc::new(MockIdentity::undetermined());
    let store = store_with(&identity);
    assert_eq!(store.state(), SessionState::Uninitialized);

    let determine = async {
        wait_until_initializing(&store).await;
        let session = store.session();
        assert!(!session.initialized);
        assert!(!session.login_redirect_required());
        identity.broadcaster.publish(None);
    };
    let (session, ()) = tokio::join!(store.initialize(), determine);

    let session = session.unwrap();
    assert!(session.initialized);
    assert!(session.current_user.is_none());
    assert!(session.login_redirect_required());
}

#[tokio::test]
async fn test_concurrent_initialize_registers_one_subscription() {
    let identity = Arc::new(MockIdentity::undetermined());
    let store = store_with(&identity);
    let ann = AuthUser::new("uid-ann", "a@b.com");

    let determine = async {
        wait_until_initializing(&store).await;
        identity.broadcaster.publish(Some(ann.clone()));
    };
    let (first, second, ()) = tokio::join!(store.initialize(), store.initialize(), determine);

    let first = first.unwrap();
    assert_eq!(first, second.unwrap());
    assert_eq!(first.current_user, Some(ann));

    store.initialize().await.unwrap();
    assert_eq!(identity.subscriptions.load(Ordering::SeqCst), 1);
    assert_eq!(identity.broadcaster.subscriber_count(), 1);
}

#[tokio::test]
async fn test_sign_in_then_sign_out_ends_signed_out() {
    let identity = Arc::new(MockIdentity::signed_out().with_account("a@b.com", "Secret123!", "Ann"));
    let store = store_with(&identity);
    store.initialize().await.unwrap();

    let mut changes = store.subscribe();
    let watcher = tokio::spawn(async move {
        let mut all_initialized = true;
        while changes.changed().await.is_ok() {
            all_initialized &= changes.borrow_and_update().is_initialized();
        }
        all_initialized
    });

    store.sign_in("a@b.com", "Secret123!").await.unwrap();
    let session = store.settled().await.unwrap();
    assert_eq!(session.current_user.unwrap().display_name.as_deref(), Some("Ann"));

    store.sign_out().await.unwrap();
    let session = store.settled().await.unwrap();
    assert!(session.current_user.is_none());
    assert!(session.initialized);

    // Signing out twice is fine.
    store.sign_out().await.unwrap();

    store.shutdown().await;
    drop(store);
    assert!(watcher.await.unwrap());
}

#[tokio::test]
async fn test_sign_in_selects_persistence_first() {
    let identity = Arc::new(MockIdentity::signed_out().with_account("a@b.com", "Secret123!", "Ann"));
    let store = store_with(&identity).with_persistence(Persistence::Session);

    store.sign_in("a@b.com", "Secret123!").await.unwrap();
    assert_eq!(*identity.persistence.lock().unwrap(), Some(Persistence::Session));
}

#[tokio::test]
async fn test_update_user_without_session_fails() {
    let identity = Arc::new(MockIdentity::signed_out());
    let store = store_with(&identity);

    let err = store.update_user("Ann", None).await.unwrap_err();
    assert!(err.is_no_session());
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(identity.profile_updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_update_user_sets_name_and_clears_photo() {
    let identity = Arc::new(MockIdentity::signed_out().with_account("a@b.com", "Secret123!", "Ann"));
    let store = store_with(&identity);
    store.sign_in("a@b.com", "Secret123!").await.unwrap();
    store.settled().await.unwrap();

    store
        .update_user("Ann B", Some("https://img.example/ann.png".into()))
        .await
        .unwrap();
    let user = store.session().current_user.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Ann B"));
    assert_eq!(user.photo_url.as_deref(), Some("https://img.example/ann.png"));

    store.update_user("Ann B", None).await.unwrap();
    assert_eq!(store.session().current_user.unwrap().photo_url, None);
}

#[tokio::test]
async fn test_sign_up_then_wrong_password_leaves_user_unchanged() {
    let identity = Arc::new(MockIdentity::signed_out());
    let store = store_with(&identity);

    store.sign_up("a@b.com", "Secret123!", "Ann").await.unwrap();
    let user = store.session().current_user.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Ann"));
    assert_eq!(user.email.as_deref(), Some("a@b.com"));

    let err = store.sign_in("a@b.com", "wrong").await.unwrap_err();
    assert_eq!(err.auth_reason(), Some(&AuthErrorReason::WrongCredentials));
    assert_eq!(store.settled().await.unwrap().current_user, Some(user));
}

#[tokio::test]
async fn test_sign_up_with_failed_profile_ends_signed_out() {
    let identity = Arc::new(MockIdentity::signed_out());
    identity.fail_profile_updates.store(true, Ordering::SeqCst);
    let store = store_with(&identity);

    let err = store.sign_up("a@b.com", "Secret123!", "Ann").await.unwrap_err();
    assert_eq!(err.auth_reason(), Some(&AuthErrorReason::Network));

    let session = store.settled().await.unwrap();
    assert!(session.current_user.is_none());
    assert!(identity.current_user().is_none());
}

#[tokio::test]
async fn test_sign_up_rejections() {
    let identity = Arc::new(MockIdentity::signed_out().with_account("a@b.com", "Secret123!", "Ann"));
    let store = store_with(&identity);

    let err = store.sign_up("not-an-email", "Secret123!", "Ann").await.unwrap_err();
    assert!(err.is_validation());
    let err = store.sign_up("c@d.com", "Secret123!", "   ").await.unwrap_err();
    assert!(err.is_validation());
    assert!(!identity.accounts.lock().unwrap().contains_key("c@d.com"));

    let err = store.sign_up("a@b.com", "Secret123!", "Ann").await.unwrap_err();
    assert_eq!(err.auth_reason(), Some(&AuthErrorReason::EmailAlreadyInUse));
    let err = store.sign_up("c@d.com", "123", "Cid").await.unwrap_err();
    assert_eq!(err.auth_reason(), Some(&AuthErrorReason::WeakPassword));
    assert!(store.session().current_user.is_none());
}

#[tokio::test]
async fn test_change_password_flow() {
    let identity = Arc::new(MockIdentity::signed_out().with_account("a@b.com", "old-pass", "Ann"));
    let store = store_with(&identity);

    let form = ChangePasswordForm::new("old-pass", "new-pass", "new-pass");
    assert!(store.change_password(&form).await.unwrap_err().is_no_session());

    store.sign_in("a@b.com", "old-pass").await.unwrap();
    store.settled().await.unwrap();

    let mismatch = ChangePasswordForm::new("old-pass", "new-pass", "other");
    let err = store.change_password(&mismatch).await.unwrap_err();
    assert_eq!(err.user_message().as_deref(), Some("New passwords do not match."));

    let wrong = ChangePasswordForm::new("nope", "new-pass", "new-pass");
    let err = store.change_password(&wrong).await.unwrap_err();
    assert_eq!(err.auth_reason(), Some(&AuthErrorReason::WrongCredentials));

    store.change_password(&form).await.unwrap();
    store.sign_out().await.unwrap();
    store.sign_in("a@b.com", "new-pass").await.unwrap();
}

#[tokio::test]
async fn test_shutdown_releases_subscription() {
    let identity = Arc::new(MockIdentity::signed_out());
    let store = store_with(&identity);
    assert!(!store.is_listening());
    store.initialize().await.unwrap();
    assert!(store.is_listening());
    assert_eq!(identity.broadcaster.subscriber_count(), 1);

    store.shutdown().await;
    assert!(!store.is_listening());
    assert_eq!(identity.broadcaster.subscriber_count(), 0);

    // Waiting on a stopped store fails instead of hanging.
    identity.broadcaster.publish(Some(AuthUser::new("u1", "x@y.io")));
    assert!(store.settled().await.is_err());
}
