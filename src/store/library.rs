//! Video record collection manager
//!
//! Owns the ordered collection of `VideoRecord`s; every mutation goes through
//! here. Ordering is most-recently-touched-first: add, status change and
//! watch-progress updates move a record to the front. Progress ticks mutate
//! in place; they arrive far too often to justify reordering.
//!
//! The library is a pure in-memory structure; transfer cancellation and
//! filesystem cleanup belong to the download manager.

use uuid::Uuid;

use crate::models::{DownloadStatus, ResumeSnapshot, VideoRecord};

/// Ordered collection of video records, newest activity first.
#[derive(Debug, Default)]
pub struct Library {
    videos: Vec<VideoRecord>,
}

impl Library {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from restored records, preserving their order
    pub fn from_records(videos: Vec<VideoRecord>) -> Self {
        Self { videos }
    }

    /// Read-only view of the collection, front first
    pub fn records(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Look up a record by id
    pub fn get(&self, id: Uuid) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.id == id)
    }

    /// Insert a new record at the front. Callers guarantee id freshness by
    /// generating a new UUID per download.
    pub fn add(&mut self, record: VideoRecord) {
        self.videos.insert(0, record);
    }

    /// Set status (and error message iff status is `Error`) and move the
    /// record to the front. Reaching `Downloaded` drops the resume snapshot.
    /// Returns false if the id is absent.
    pub fn set_status(
        &mut self,
        id: Uuid,
        status: DownloadStatus,
        error_message: Option<String>,
    ) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let video = &mut self.videos[idx];
        video.status = status;
        if status == DownloadStatus::Error {
            if let Some(message) = error_message {
                video.error_message = Some(message);
            }
        }
        if status == DownloadStatus::Downloaded {
            video.resume = None;
        }
        self.move_to_front(idx);
        true
    }

    /// Set download progress and status in place, optionally persisting a
    /// resume snapshot. Does not reorder. Returns false if the id is absent.
    pub fn set_download_progress(
        &mut self,
        id: Uuid,
        progress: f64,
        status: DownloadStatus,
        snapshot: Option<ResumeSnapshot>,
    ) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let video = &mut self.videos[idx];
        video.download_progress = progress;
        video.status = status;
        if let Some(snapshot) = snapshot {
            video.resume = Some(snapshot);
        }
        true
    }

    /// Set watch progress and move the record to the front.
    /// Returns false if the id is absent.
    pub fn set_watch_progress(&mut self, id: Uuid, progress: f64) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.videos[idx].watch_progress = progress;
        self.move_to_front(idx);
        true
    }

    /// Record that the local thumbnail copy landed; moves to front.
    /// Returns false if the id is absent.
    pub fn mark_thumbnail_downloaded(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.videos[idx].thumbnail_downloaded = true;
        self.move_to_front(idx);
        true
    }

    /// Remove and return a record. None if the id is absent.
    pub fn remove(&mut self, id: Uuid) -> Option<VideoRecord> {
        let idx = self.index_of(id)?;
        Some(self.videos.remove(idx))
    }

    /// Empty the collection, returning every record for artifact cleanup.
    pub fn clear(&mut self) -> Vec<VideoRecord> {
        std::mem::take(&mut self.videos)
    }

    fn index_of(&self, id: Uuid) -> Option<usize> {
        self.videos.iter().position(|v| v.id == id)
    }

    fn move_to_front(&mut self, idx: usize) {
        if idx > 0 {
            let video = self.videos.remove(idx);
            self.videos.insert(0, video);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(title: &str) -> VideoRecord {
        VideoRecord::new(
            Uuid::new_v4(),
            title,
            PathBuf::from(format!("/media/{title}.mp4")),
            "http://x/thumb.jpg",
            PathBuf::from(format!("/media/{title}_thumbnail.jpg")),
        )
    }

    fn titles(library: &Library) -> Vec<&str> {
        library.records().iter().map(|v| v.title.as_str()).collect()
    }

    // -------------------------------------------------------------------------
    // Ordering Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_inserts_at_front() {
        let mut library = Library::new();
        library.add(record("first"));
        library.add(record("second"));
        library.add(record("third"));
        assert_eq!(titles(&library), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_set_status_moves_to_front() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);
        library.add(record("b"));
        library.add(record("c"));

        assert!(library.set_status(a_id, DownloadStatus::Downloaded, None));
        assert_eq!(titles(&library), vec!["a", "c", "b"]);
        assert_eq!(library.records()[0].status, DownloadStatus::Downloaded);
    }

    #[test]
    fn test_set_watch_progress_moves_to_front() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);
        library.add(record("b"));

        assert!(library.set_watch_progress(a_id, 0.5));
        assert_eq!(titles(&library), vec!["a", "b"]);
        assert_eq!(library.records()[0].watch_progress, 0.5);
    }

    #[test]
    fn test_progress_tick_does_not_reorder() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);
        library.add(record("b"));

        assert!(library.set_download_progress(a_id, 42.0, DownloadStatus::Downloading, None));
        // Still in place
        assert_eq!(titles(&library), vec!["b", "a"]);
        assert_eq!(library.get(a_id).unwrap().download_progress, 42.0);
    }

    #[test]
    fn test_mark_thumbnail_downloaded_moves_to_front() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);
        library.add(record("b"));

        assert!(library.mark_thumbnail_downloaded(a_id));
        assert_eq!(titles(&library), vec!["a", "b"]);
        assert!(library.records()[0].thumbnail_downloaded);
    }

    // -------------------------------------------------------------------------
    // Status / Error Message Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_error_message_set_only_for_error_status() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);

        // Non-error status ignores the message
        library.set_status(a_id, DownloadStatus::Downloaded, Some("ignored".into()));
        assert!(library.get(a_id).unwrap().error_message.is_none());

        library.set_status(a_id, DownloadStatus::Error, Some("disk full".into()));
        assert_eq!(
            library.get(a_id).unwrap().error_message.as_deref(),
            Some("disk full")
        );
    }

    #[test]
    fn test_downloaded_clears_resume_snapshot() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);

        library.set_download_progress(
            a_id,
            50.0,
            DownloadStatus::Downloading,
            Some(ResumeSnapshot {
                url: "http://x/v.mp4".into(),
                file_path: PathBuf::from("/media/v.mp4"),
                bytes_written: 1024,
            }),
        );
        assert!(library.get(a_id).unwrap().resume.is_some());

        library.set_status(a_id, DownloadStatus::Downloaded, None);
        assert!(library.get(a_id).unwrap().resume.is_none());
    }

    // -------------------------------------------------------------------------
    // Missing-Id Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_missing_id_is_silent_noop() {
        let mut library = Library::new();
        library.add(record("a"));
        let ghost = Uuid::new_v4();

        assert!(!library.set_status(ghost, DownloadStatus::Error, Some("x".into())));
        assert!(!library.set_download_progress(ghost, 10.0, DownloadStatus::Downloading, None));
        assert!(!library.set_watch_progress(ghost, 0.5));
        assert!(!library.mark_thumbnail_downloaded(ghost));
        assert!(library.remove(ghost).is_none());
        assert_eq!(library.len(), 1);
    }

    // -------------------------------------------------------------------------
    // Remove / Clear Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_remove_returns_record() {
        let mut library = Library::new();
        let a = record("a");
        let a_id = a.id;
        library.add(a);
        library.add(record("b"));

        let removed = library.remove(a_id).unwrap();
        assert_eq!(removed.title, "a");
        assert_eq!(library.len(), 1);
        assert!(library.get(a_id).is_none());
    }

    #[test]
    fn test_clear_returns_all_records() {
        let mut library = Library::new();
        library.add(record("a"));
        library.add(record("b"));

        let cleared = library.clear();
        assert_eq!(cleared.len(), 2);
        assert!(library.is_empty());

        // Clearing twice is the same as clearing once
        assert!(library.clear().is_empty());
        assert!(library.is_empty());
    }

    #[test]
    fn test_restore_preserves_order() {
        let mut library = Library::new();
        library.add(record("a"));
        library.add(record("b"));
        let saved = library.records().to_vec();

        let restored = Library::from_records(saved);
        assert_eq!(titles(&restored), vec!["b", "a"]);
    }
}
