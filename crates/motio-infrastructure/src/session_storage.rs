//! File-backed storage for the `local` persistence mode.

use std::path::PathBuf;

use motio_core::user::{PersistedSession, SessionStorage};
use motio_core::{MotioError, Result};

use crate::atomic_file::{FileMode, remove_if_exists, write_atomic};
use crate::paths::MotioPaths;

/// Keeps the signed-in session in `session.json` (mode 600 on Unix).
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(paths: &MotioPaths) -> Result<Self> {
        Ok(Self::with_path(paths.session_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait::async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<PersistedSession>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt file means "signed out", not a startup failure.
                tracing::warn!(
                    "[FileSessionStorage] Ignoring unreadable {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &PersistedSession) -> Result<()> {
        let content = serde_json::to_vec_pretty(session)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content, FileMode::Private))
            .await
            .map_err(|e| MotioError::internal(format!("session write task failed: {e}")))??;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || remove_if_exists(&path))
            .await
            .map_err(|e| MotioError::internal(format!("session clear task failed: {e}")))??;
        Ok(())
    }
}
