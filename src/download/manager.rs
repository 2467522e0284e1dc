//! Download coordinator
//!
//! Drives the two-phase download (thumbnail first, best-effort; then the
//! media transfer), owns the library and the table of in-flight transfer
//! handles, and persists the collection after every durable mutation.
//!
//! The handle table is the authority on what is "active": every late
//! callback checks it before touching the library, so a cancelled transfer
//! cannot resurrect a removed record. Cancellation is cooperative: at most
//! one already-admitted progress write may land after removal, which is
//! harmless because the record is gone.
//!
//! Lock order is always `active` before `library`.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::download::transfer::{
    fetch_to_file, percent, HttpTransfer, TransferError, TransferHandle,
};
use crate::models::{derive_paths, DownloadStatus, ResumeSnapshot, VideoRecord};
use crate::store::persist::{self, KvStore};
use crate::store::Library;

// =============================================================================
// Boundary Traits
// =============================================================================

/// Filesystem boundary for artifact cleanup. Injected so tests can record
/// deletions instead of touching the disk.
pub trait Storage: Send + Sync {
    /// Delete a file. Deleting an absent file is not an error.
    fn delete(&self, path: &Path) -> std::io::Result<()>;
}

/// Real filesystem.
#[derive(Debug, Default)]
pub struct DiskStorage;

impl Storage for DiskStorage {
    fn delete(&self, path: &Path) -> std::io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// User-facing failure notifications, one per failed download.
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// Writes alerts to stderr.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

// =============================================================================
// Progress Throttle
// =============================================================================

/// Admits a progress value when it moved more than one percentage point
/// since the last admitted value, or when it reaches exactly 100. Keeps
/// per-chunk callbacks from flooding the persisted store.
#[derive(Debug, Default)]
struct ProgressThrottle {
    last: f64,
}

impl ProgressThrottle {
    fn new() -> Self {
        Self::default()
    }

    fn admit(&mut self, progress: f64) -> bool {
        if progress >= 100.0 || progress - self.last > 1.0 {
            self.last = progress;
            return true;
        }
        false
    }
}

// =============================================================================
// Download Manager
// =============================================================================

struct Inner {
    library: Mutex<Library>,
    active: Mutex<HashMap<Uuid, TransferHandle>>,
    kv: Arc<dyn KvStore>,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    client: reqwest::Client,
    media_dir: PathBuf,
}

/// Coordinates downloads over the video library. Cheap to clone; all clones
/// share the same state.
#[derive(Clone)]
pub struct DownloadManager {
    inner: Arc<Inner>,
}

/// Everything a spawned transfer task needs, cloned out of the library up
/// front so the task never re-reads record fields.
struct TransferJob {
    id: Uuid,
    title: String,
    url: String,
    file_path: PathBuf,
    thumbnail: Option<(String, PathBuf)>,
}

impl DownloadManager {
    /// Restore the library from the persisted store and build a manager
    /// around it. Records interrupted mid-transfer come back as `paused`,
    /// ready for `resume_download`.
    pub fn new(
        kv: Arc<dyn KvStore>,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        media_dir: impl Into<PathBuf>,
    ) -> Self {
        let mut videos = persist::load_videos(kv.as_ref());
        let mut demoted = false;
        for video in &mut videos {
            if video.status == DownloadStatus::Downloading {
                video.status = DownloadStatus::Paused;
                demoted = true;
            }
        }

        let manager = Self {
            inner: Arc::new(Inner {
                library: Mutex::new(Library::from_records(videos)),
                active: Mutex::new(HashMap::new()),
                kv,
                storage,
                notifier,
                client: reqwest::Client::new(),
                media_dir: media_dir.into(),
            }),
        };
        if demoted {
            manager.persist();
        }
        manager
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Snapshot of the library, most recently touched first.
    pub fn list(&self) -> Vec<VideoRecord> {
        self.inner.library.lock().unwrap().records().to_vec()
    }

    /// Snapshot of one record.
    pub fn get(&self, id: Uuid) -> Option<VideoRecord> {
        self.inner.library.lock().unwrap().get(id).cloned()
    }

    /// Number of transfers currently in flight.
    pub fn active_count(&self) -> usize {
        self.inner.active.lock().unwrap().len()
    }

    /// Wait until no transfer is in flight.
    pub async fn wait_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    // -------------------------------------------------------------------------
    // Download Lifecycle
    // -------------------------------------------------------------------------

    /// Start downloading a video. The record is registered (and persisted)
    /// before any network I/O, so it is visible immediately with zero
    /// progress. Returns the new record's id; the transfer itself runs on a
    /// background task.
    pub fn start_download(
        &self,
        url: &str,
        title: &str,
        thumbnail_url: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let thumb_url = thumbnail_url.unwrap_or_default();
        let (file_path, thumbnail_path) = derive_paths(&self.inner.media_dir, id, url, thumb_url);

        let mut record = VideoRecord::new(
            id,
            title,
            file_path.clone(),
            thumb_url,
            thumbnail_path.clone(),
        );
        if thumbnail_url.is_none() {
            record.thumbnail_url = None;
            record.thumbnail_path = None;
        }
        record.resume = Some(ResumeSnapshot {
            url: url.to_string(),
            file_path: file_path.clone(),
            bytes_written: 0,
        });

        let handle = TransferHandle::new();
        {
            let mut active = self.inner.active.lock().unwrap();
            let mut library = self.inner.library.lock().unwrap();
            library.add(record);
            active.insert(id, handle.clone());
        }
        self.persist();
        info!(%id, title, "download started");

        let job = TransferJob {
            id,
            title: title.to_string(),
            url: url.to_string(),
            file_path,
            thumbnail: thumbnail_url.map(|u| (u.to_string(), thumbnail_path)),
        };
        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_transfer(job, handle).await;
        });
        id
    }

    /// Restart a paused record's transfer from its resume snapshot. The
    /// underlying transfer picks up from the partial file on disk when the
    /// server honors ranged requests.
    pub fn resume_download(&self, id: Uuid) -> Result<()> {
        let (job, handle) = {
            let mut active = self.inner.active.lock().unwrap();
            if active.contains_key(&id) {
                bail!("Video {id} is already downloading");
            }
            let mut library = self.inner.library.lock().unwrap();
            let Some(record) = library.get(id) else {
                bail!("No video with id {id}");
            };
            if record.status != DownloadStatus::Paused {
                bail!("Video {id} is {} and cannot be resumed", record.status);
            }
            let Some(snapshot) = record.resume.clone() else {
                bail!("Video {id} has no resume state");
            };

            // Retry the thumbnail too when the first attempt never landed
            let thumbnail = match (&record.thumbnail_url, &record.thumbnail_path) {
                (Some(url), Some(path)) if !record.thumbnail_downloaded => {
                    Some((url.clone(), path.clone()))
                }
                _ => None,
            };
            let job = TransferJob {
                id,
                title: record.title.clone(),
                url: snapshot.url,
                file_path: snapshot.file_path,
                thumbnail,
            };

            library.set_status(id, DownloadStatus::Downloading, None);
            let handle = TransferHandle::new();
            active.insert(id, handle.clone());
            (job, handle)
        };
        self.persist();
        info!(%id, "download resumed");

        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_transfer(job, handle).await;
        });
        Ok(())
    }

    async fn run_transfer(&self, job: TransferJob, handle: TransferHandle) {
        // Phase one: thumbnail, best-effort. A failure never blocks the
        // media transfer.
        if let Some((thumb_url, thumb_path)) = &job.thumbnail {
            match fetch_to_file(&self.inner.client, thumb_url, thumb_path).await {
                Ok(()) => {
                    if self.mutate_if_active(job.id, |lib| {
                        lib.mark_thumbnail_downloaded(job.id);
                    }) {
                        self.persist();
                    }
                }
                Err(e) => warn!(id = %job.id, "thumbnail fetch failed: {e}"),
            }
        }

        // Phase two: the media transfer, with throttled persisted progress.
        let transfer = HttpTransfer::new(
            self.inner.client.clone(),
            job.url.clone(),
            job.file_path.clone(),
        );
        let mut throttle = ProgressThrottle::new();
        let result = transfer
            .run(&handle, |written, total| {
                let Some(progress) = percent(written, total) else {
                    return;
                };
                if !throttle.admit(progress) {
                    return;
                }
                let snapshot = ResumeSnapshot {
                    url: job.url.clone(),
                    file_path: job.file_path.clone(),
                    bytes_written: written,
                };
                if self.mutate_if_active(job.id, |lib| {
                    lib.set_download_progress(
                        job.id,
                        progress,
                        DownloadStatus::Downloading,
                        Some(snapshot),
                    );
                }) {
                    self.persist();
                }
            })
            .await;

        match result {
            Ok(bytes) => {
                if self.finish_if_active(job.id, |lib| {
                    lib.set_download_progress(job.id, 100.0, DownloadStatus::Downloading, None);
                    lib.set_status(job.id, DownloadStatus::Downloaded, None);
                }) {
                    self.persist();
                    info!(id = %job.id, bytes, "download complete");
                }
            }
            Err(TransferError::Cancelled) => {
                // Removal already dropped the handle and the record
                debug!(id = %job.id, "transfer cancelled");
            }
            Err(e) => {
                if self.finish_if_active(job.id, |lib| {
                    lib.set_status(job.id, DownloadStatus::Error, Some(e.to_string()));
                }) {
                    self.persist();
                    warn!(id = %job.id, "download failed: {e}");
                    self.inner.notifier.alert(
                        "Download error",
                        &format!("Failed to download {}: {e}", job.title),
                    );
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Cancel any in-flight transfer, drop the record, and delete its
    /// artifacts in the background. Returns the removed record, or `None`
    /// when the id is unknown (making removal idempotent).
    pub fn remove_video(&self, id: Uuid) -> Option<VideoRecord> {
        let removed = {
            let mut active = self.inner.active.lock().unwrap();
            if let Some(handle) = active.remove(&id) {
                handle.cancel();
            }
            let mut library = self.inner.library.lock().unwrap();
            library.remove(id)
        };
        if let Some(record) = &removed {
            self.delete_artifacts(record);
            self.persist();
            info!(%id, "video removed");
        }
        removed
    }

    /// Remove every record: cancel all transfers, delete all artifacts,
    /// empty and persist the collection. Returns how many records were
    /// dropped; clearing an empty library is a no-op.
    pub fn clear_all_videos(&self) -> usize {
        let records = {
            let mut active = self.inner.active.lock().unwrap();
            for (_, handle) in active.drain() {
                handle.cancel();
            }
            let mut library = self.inner.library.lock().unwrap();
            library.clear()
        };
        for record in &records {
            self.delete_artifacts(record);
        }
        if !records.is_empty() {
            self.persist();
            info!(count = records.len(), "library cleared");
        }
        records.len()
    }

    /// Delete a record's media and thumbnail files without blocking the
    /// caller. Failures are logged and otherwise ignored; stale files are
    /// preferable to a stuck removal.
    fn delete_artifacts(&self, record: &VideoRecord) {
        for path in [&record.file_path, &record.thumbnail_path]
            .into_iter()
            .flatten()
        {
            let storage = Arc::clone(&self.inner.storage);
            let path = path.clone();
            tokio::spawn(async move {
                if let Err(e) = storage.delete(&path) {
                    warn!("failed to delete {}: {e}", path.display());
                }
            });
        }
    }

    // -------------------------------------------------------------------------
    // Watch Progress
    // -------------------------------------------------------------------------

    /// Record a playback position for a video. Positions at or below zero
    /// are dropped; a player often emits a zero sample before it has
    /// actually sought anywhere. Applies to errored records too; only the
    /// record's existence matters. Returns whether the id is known.
    pub fn update_watch_progress(&self, id: Uuid, position: f64) -> bool {
        if position <= 0.0 {
            return self.inner.library.lock().unwrap().get(id).is_some();
        }
        let updated = self
            .inner
            .library
            .lock()
            .unwrap()
            .set_watch_progress(id, position);
        if updated {
            self.persist();
        }
        updated
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Apply a library mutation only while the id still has a live handle.
    /// Returns whether the mutation was applied.
    fn mutate_if_active(&self, id: Uuid, f: impl FnOnce(&mut Library)) -> bool {
        let active = self.inner.active.lock().unwrap();
        if !active.contains_key(&id) {
            return false;
        }
        let mut library = self.inner.library.lock().unwrap();
        f(&mut library);
        true
    }

    /// Retire the handle and apply the terminal mutation atomically.
    /// Returns false when the handle is already gone (record was removed).
    fn finish_if_active(&self, id: Uuid, f: impl FnOnce(&mut Library)) -> bool {
        let mut active = self.inner.active.lock().unwrap();
        if active.remove(&id).is_none() {
            return false;
        }
        let mut library = self.inner.library.lock().unwrap();
        f(&mut library);
        true
    }

    /// Serialize the library to the persisted store. A write failure is
    /// logged, not propagated; in-memory state stays authoritative.
    fn persist(&self) {
        let snapshot = self.inner.library.lock().unwrap().records().to_vec();
        if let Err(e) = persist::save_videos(self.inner.kv.as_ref(), &snapshot) {
            warn!("failed to persist download state: {e}");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
