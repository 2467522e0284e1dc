//! Persisted key-value store
//!
//! Durable persistence of serialized application state, restored at startup.
//! Two independent partitions, `downloads` and `session`, so clearing one
//! never touches the other. Restoration is all-or-nothing per partition: a
//! missing or corrupt entry yields that partition's empty default rather
//! than a partial merge.
//!
//! There is no schema migration; a shape change to `VideoRecord` requires a
//! key bump and explicit migration.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

use crate::models::VideoRecord;
use crate::store::session::Session;

/// Partition key for the downloaded-video collection
pub const DOWNLOADS_KEY: &str = "downloads";
/// Partition key for user/session state
pub const SESSION_KEY: &str = "session";

// =============================================================================
// KvStore Trait
// =============================================================================

/// Key-value persistence boundary. Implementations must tolerate concurrent
/// use from the async runtime (calls are short and blocking).
pub trait KvStore: Send + Sync {
    /// Fetch the serialized value for a key, if present
    fn get(&self, key: &str) -> Option<String>;
    /// Store a serialized value under a key
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Drop a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// File-Backed Store
// =============================================================================

/// `KvStore` backed by one JSON file per key under a data directory.
#[derive(Debug)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        // Write through a temp file so a crash mid-write never corrupts the
        // existing partition.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove persisted key"),
        }
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// `KvStore` held entirely in memory. Used for ephemeral runs and as the
/// injection point in tests.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// Partition Helpers
// =============================================================================

/// Restore the downloaded-video partition. Missing or unparseable state
/// yields an empty collection.
pub fn load_videos(kv: &dyn KvStore) -> Vec<VideoRecord> {
    let Some(raw) = kv.get(DOWNLOADS_KEY) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(videos) => videos,
        Err(e) => {
            warn!("discarding corrupt download state: {e}");
            Vec::new()
        }
    }
}

/// Serialize the downloaded-video partition.
pub fn save_videos(kv: &dyn KvStore, videos: &[VideoRecord]) -> Result<()> {
    let json = serde_json::to_string(videos).context("Failed to serialize download state")?;
    kv.set(DOWNLOADS_KEY, &json)
}

/// Restore the session partition. Missing or unparseable state yields the
/// logged-out default.
pub fn load_session(kv: &dyn KvStore) -> Session {
    let Some(raw) = kv.get(SESSION_KEY) else {
        return Session::default();
    };
    match serde_json::from_str(&raw) {
        Ok(session) => session,
        Err(e) => {
            warn!("discarding corrupt session state: {e}");
            Session::default()
        }
    }
}

/// Serialize the session partition.
pub fn save_session(kv: &dyn KvStore, session: &Session) -> Result<()> {
    let json = serde_json::to_string(session).context("Failed to serialize session state")?;
    kv.set(SESSION_KEY, &json)
}

// =============================================================================
// Unit Tests
// =============================================================================
