use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::progress::tracker::ProgressState;
use crate::speech::rotator::CredentialIndexSink;
use crate::storage::blob::{BlobStore, JSON_CONTENT_TYPE};

/// Default object key of the remote progress record.
pub const DEFAULT_STATE_KEY: &str = "biblia/state.json";

/// Durable home of [`ProgressState`]: a remote primary copy plus a local cache file.
pub struct ProgressStore {
    remote: Arc<dyn BlobStore>,
    key: String,
    local_path: PathBuf,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("remote", &self.remote.describe())
            .field("key", &self.key)
            .field("local_path", &self.local_path)
            .finish()
    }
}

impl ProgressStore {
    /// Keep the primary record under `key` in `remote` and cache it at `local_path`.
    pub fn new(
        remote: Arc<dyn BlobStore>,
        key: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            remote,
            key: key.into(),
            local_path: local_path.into(),
        }
    }

    /// Remote object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Local cache file.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Current state.
    ///
    /// A missing remote record is a fresh start. A remote failure falls back to the local cache,
    /// then to the empty state.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn load(&self) -> ProgressState {
        let remote = self.remote.get(&self.key).and_then(|bytes| match bytes {
            Some(b) => parse_state(&b).map(Some),
            None => Ok(None),
        });

        match remote {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!("no remote progress record, starting from the beginning");
                ProgressState::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote progress unavailable, trying local cache");
                self.load_local().unwrap_or_default()
            }
        }
    }

    fn load_local(&self) -> Option<ProgressState> {
        let bytes = match std::fs::read(&self.local_path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.local_path.display(), error = %e, "local progress unreadable");
                return None;
            }
        };
        match parse_state(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %self.local_path.display(), error = %e, "local progress corrupt");
                None
            }
        }
    }

    /// Persist `state`: local cache first, then remote.
    ///
    /// A single failing copy is logged; only when neither copy can be written does this fail with
    /// [`VersecastError::StorePersist`].
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn save(&self, state: &ProgressState) -> VersecastResult<()> {
        let body = serde_json::to_vec_pretty(state)
            .map_err(|e| VersecastError::serde(format!("encode progress: {e}")))?;

        let local = crate::media::ffmpeg::ensure_parent_dir(&self.local_path).and_then(|()| {
            std::fs::write(&self.local_path, &body).map_err(|e| {
                VersecastError::store(format!("write '{}': {e}", self.local_path.display()))
            })
        });
        if let Err(e) = &local {
            tracing::warn!(error = %e, "local progress cache not written");
        }

        let remote = self.remote.put(&self.key, body, JSON_CONTENT_TYPE);
        if let Err(e) = &remote {
            tracing::warn!(error = %e, "remote progress record not written");
        }

        match (local, remote) {
            (Err(l), Err(r)) => Err(VersecastError::store_persist(format!(
                "local: {l}; remote: {r}"
            ))),
            _ => {
                tracing::debug!(
                    book = state.book,
                    chapter = state.chapter,
                    credential_index = state.credential_index,
                    "progress saved"
                );
                Ok(())
            }
        }
    }

    /// Load, set the credential index to `index`, save.
    pub fn record_credential_index(&self, index: usize) -> VersecastResult<ProgressState> {
        let mut state = self.load();
        state.credential_index = index;
        self.save(&state)?;
        Ok(state)
    }
}

fn parse_state(bytes: &[u8]) -> VersecastResult<ProgressState> {
    serde_json::from_slice(bytes).map_err(|e| VersecastError::serde(format!("decode progress: {e}")))
}

/// [`CredentialIndexSink`] that writes rotations into a known progress state.
///
/// The cursor fields are kept as they were when the run started, so a rotation never moves the
/// chapter cursor.
#[derive(Debug)]
pub struct ProgressLedger<'s> {
    store: &'s ProgressStore,
    state: ProgressState,
}

impl<'s> ProgressLedger<'s> {
    /// Record rotations against `state`.
    pub fn new(store: &'s ProgressStore, state: ProgressState) -> Self {
        Self { store, state }
    }

    /// Latest state written through this ledger.
    pub fn state(&self) -> ProgressState {
        self.state
    }
}

impl CredentialIndexSink for ProgressLedger<'_> {
    fn persist_index(&mut self, index: usize) -> VersecastResult<()> {
        self.state.credential_index = index;
        self.store.save(&self.state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/progress/store.rs"]
mod tests;
