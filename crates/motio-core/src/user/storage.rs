//! Storage for a signed-in session that should survive restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::AuthUser;
use crate::error::Result;

/// A signed-in user together with the tokens needed to act on their behalf.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: AuthUser,
    pub id_token: String,
    pub refresh_token: String,
    /// When `id_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl PersistedSession {
    /// True when the id token expires within `margin_secs`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.expires_at - chrono::Duration::seconds(margin_secs) <= now
    }
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("user", &self.user)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Backing store for [`Persistence::Local`](super::Persistence::Local).
#[async_trait::async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> Result<Option<PersistedSession>>;

    async fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Removes any stored session. Succeeds when nothing is stored.
    async fn clear(&self) -> Result<()>;
}
