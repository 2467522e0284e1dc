//! Data structures and types for vidstash
//!
//! Contains all shared models used across the application organized by domain:
//! - **Records**: downloaded/downloading video metadata and lifecycle status
//! - **Transfers**: serializable resume snapshots for interrupted downloads
//! - **Addons**: stream links resolved through a Stremio-style addon

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// =============================================================================
// Download Status
// =============================================================================

/// Lifecycle status of a video record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// Transfer in flight
    Downloading,
    /// Transfer interrupted; a resume snapshot may allow restarting
    Paused,
    /// Media fully on disk
    Downloaded,
    /// Transfer failed; `error_message` holds the cause
    Error,
}

impl DownloadStatus {
    /// Terminal statuses see no further automatic transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Downloaded | DownloadStatus::Error)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Downloading => write!(f, "downloading"),
            DownloadStatus::Paused => write!(f, "paused"),
            DownloadStatus::Downloaded => write!(f, "downloaded"),
            DownloadStatus::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Resume Snapshot
// =============================================================================

/// Serializable snapshot of an in-flight transfer, enough to restart it
/// from the partial file after a process restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    /// Source URL of the media transfer
    pub url: String,
    /// Destination path of the partial file
    pub file_path: PathBuf,
    /// Bytes confirmed written at snapshot time
    pub bytes_written: u64,
}

// =============================================================================
// Video Record
// =============================================================================

/// One entry per downloaded or in-progress video.
///
/// Records are kept most-recently-touched-first; creation, status changes and
/// watch-progress updates all move a record to the front of the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Unique identifier, generated at download start
    pub id: Uuid,
    /// Display name (may encode a season/episode prefix)
    pub title: String,
    /// Lifecycle status
    pub status: DownloadStatus,
    /// Percentage in [0, 100]; meaningful while downloading
    pub download_progress: f64,
    /// Normalized playback position in [0, 1]
    pub watch_progress: f64,
    /// Location of the media artifact
    pub file_path: Option<PathBuf>,
    /// Remote thumbnail URL (UI fallback when the local copy is missing)
    pub thumbnail_url: Option<String>,
    /// Locally cached thumbnail
    pub thumbnail_path: Option<PathBuf>,
    /// Whether the local thumbnail copy landed
    pub thumbnail_downloaded: bool,
    /// Present only when status is `error`
    pub error_message: Option<String>,
    /// Creation timestamp
    pub download_date: DateTime<Utc>,
    /// Resume state for an interrupted transfer
    pub resume: Option<ResumeSnapshot>,
}

impl VideoRecord {
    /// Create a fresh record at download start: downloading, zero progress,
    /// thumbnail not yet cached.
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        file_path: PathBuf,
        thumbnail_url: impl Into<String>,
        thumbnail_path: PathBuf,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            status: DownloadStatus::Downloading,
            download_progress: 0.0,
            watch_progress: 0.0,
            file_path: Some(file_path),
            thumbnail_url: Some(thumbnail_url.into()),
            thumbnail_path: Some(thumbnail_path),
            thumbnail_downloaded: false,
            error_message: None,
            download_date: Utc::now(),
            resume: None,
        }
    }
}

impl fmt::Display for VideoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            DownloadStatus::Downloading => write!(
                f,
                "{}  {}  {:.0}%",
                self.id, self.title, self.download_progress
            ),
            DownloadStatus::Error => write!(
                f,
                "{}  {}  error: {}",
                self.id,
                self.title,
                self.error_message.as_deref().unwrap_or("unknown")
            ),
            _ => write!(
                f,
                "{}  {}  {} (watched {:.0}%)",
                self.id,
                self.title,
                self.status,
                self.watch_progress * 100.0
            ),
        }
    }
}

// =============================================================================
// Addon Models
// =============================================================================

/// Stream link resolved through a Stremio-style addon.
///
/// Links carry either a direct HTTP `url` (downloadable) or a bare torrent
/// `info_hash` (playable through a separate torrent engine, not downloadable
/// by this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamLink {
    pub name: String,
    pub title: String,
    pub url: Option<String>,
    pub info_hash: Option<String>,
    pub file_idx: Option<u32>,
}

impl StreamLink {
    /// Whether this link can be fed to the download manager directly
    pub fn is_downloadable(&self) -> bool {
        self.url.is_some()
    }

    /// First line of the title, for one-line listings
    pub fn display_title(&self) -> &str {
        self.title.lines().next().unwrap_or(&self.title)
    }
}

impl fmt::Display for StreamLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_downloadable() { "url" } else { "torrent" };
        write!(f, "[{}] {} - {}", kind, self.name, self.display_title())
    }
}

// =============================================================================
// Path Derivation
// =============================================================================

/// Extract the lowercased file extension from a URL, ignoring any query
/// string. Returns an empty string when the last path segment has no dot.
pub fn file_extension(url: &str) -> String {
    let clean = url.split('?').next().unwrap_or(url);
    let file_name = clean.rsplit('/').next().unwrap_or("");
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Derived media file name for an id: `{id}.{ext}` (trailing dot when the
/// source URL carried no extension).
pub fn media_file_name(id: Uuid, ext: &str) -> String {
    format!("{}.{}", id, ext)
}

/// Derived thumbnail file name for an id: `{id}_thumbnail.{ext}`.
pub fn thumbnail_file_name(id: Uuid, ext: &str) -> String {
    format!("{}_thumbnail.{}", id, ext)
}

/// Resolve the media and thumbnail destination paths for a new download.
pub fn derive_paths(
    media_dir: &Path,
    id: Uuid,
    url: &str,
    thumbnail_url: &str,
) -> (PathBuf, PathBuf) {
    let file_path = media_dir.join(media_file_name(id, &file_extension(url)));
    let thumbnail_path = media_dir.join(thumbnail_file_name(id, &file_extension(thumbnail_url)));
    (file_path, thumbnail_path)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // DownloadStatus Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_status_display() {
        assert_eq!(DownloadStatus::Downloading.to_string(), "downloading");
        assert_eq!(DownloadStatus::Paused.to_string(), "paused");
        assert_eq!(DownloadStatus::Downloaded.to_string(), "downloaded");
        assert_eq!(DownloadStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&DownloadStatus::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");

        let parsed: DownloadStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, DownloadStatus::Error);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!DownloadStatus::Downloading.is_terminal());
        assert!(!DownloadStatus::Paused.is_terminal());
        assert!(DownloadStatus::Downloaded.is_terminal());
        assert!(DownloadStatus::Error.is_terminal());
    }

    // -------------------------------------------------------------------------
    // File Extension Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_file_extension_basic() {
        assert_eq!(file_extension("http://x/video.mp4"), "mp4");
        assert_eq!(file_extension("http://x/a/b/movie.MKV"), "mkv");
    }

    #[test]
    fn test_file_extension_query_string() {
        assert_eq!(file_extension("http://x/video.mp4?token=abc.def"), "mp4");
    }

    #[test]
    fn test_file_extension_missing() {
        assert_eq!(file_extension("http://x/stream"), "");
        assert_eq!(file_extension("http://x/"), "");
        assert_eq!(file_extension(""), "");
    }

    #[test]
    fn test_derived_file_names() {
        let id = Uuid::nil();
        assert_eq!(
            media_file_name(id, "mp4"),
            "00000000-0000-0000-0000-000000000000.mp4"
        );
        assert_eq!(
            thumbnail_file_name(id, "jpg"),
            "00000000-0000-0000-0000-000000000000_thumbnail.jpg"
        );
        // Extensionless URLs still get the separator
        assert_eq!(
            media_file_name(id, ""),
            "00000000-0000-0000-0000-000000000000."
        );
    }

    #[test]
    fn test_derive_paths() {
        let id = Uuid::new_v4();
        let (file, thumb) = derive_paths(
            Path::new("/data/media"),
            id,
            "http://x/show.mp4",
            "http://x/poster.jpg",
        );
        assert_eq!(file, Path::new("/data/media").join(format!("{}.mp4", id)));
        assert_eq!(
            thumb,
            Path::new("/data/media").join(format!("{}_thumbnail.jpg", id))
        );
    }

    // -------------------------------------------------------------------------
    // VideoRecord Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_record_defaults() {
        let record = VideoRecord::new(
            Uuid::new_v4(),
            "Show S1E1",
            PathBuf::from("/data/x.mp4"),
            "http://x/thumb.jpg",
            PathBuf::from("/data/x_thumbnail.jpg"),
        );
        assert_eq!(record.status, DownloadStatus::Downloading);
        assert_eq!(record.download_progress, 0.0);
        assert_eq!(record.watch_progress, 0.0);
        assert!(!record.thumbnail_downloaded);
        assert!(record.error_message.is_none());
        assert!(record.resume.is_none());
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = VideoRecord::new(
            Uuid::new_v4(),
            "Movie",
            PathBuf::from("/m.mkv"),
            "http://x/t.png",
            PathBuf::from("/t.png"),
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: VideoRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.status, DownloadStatus::Downloading);
        assert_eq!(back.title, "Movie");
    }

    // -------------------------------------------------------------------------
    // StreamLink Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_stream_link_downloadable() {
        let direct = StreamLink {
            name: "Addon".into(),
            title: "Movie 1080p".into(),
            url: Some("http://cdn/x.mp4".into()),
            info_hash: None,
            file_idx: None,
        };
        let torrent = StreamLink {
            name: "Addon".into(),
            title: "Movie 4K".into(),
            url: None,
            info_hash: Some("abc123".into()),
            file_idx: Some(0),
        };
        assert!(direct.is_downloadable());
        assert!(!torrent.is_downloadable());
    }

    #[test]
    fn test_stream_link_display_title_first_line() {
        let link = StreamLink {
            name: "Addon".into(),
            title: "Movie.2022.1080p\n👤 142 💾 4.2 GB".into(),
            url: None,
            info_hash: Some("abc".into()),
            file_idx: None,
        };
        assert_eq!(link.display_title(), "Movie.2022.1080p");
    }
}
