//! vidstash - offline downloads and watch progress for streamed media
//!
//! The download engine of a streaming client: downloads videos for offline
//! playback, caches their thumbnails, tracks how far each one was watched,
//! and persists all of it so interrupted downloads survive a restart.
//!
//! The library surface is [`DownloadManager`] plus the persisted store it
//! sits on; the binary wraps it in a scriptable CLI.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod models;
pub mod playback;
pub mod store;

pub use api::AddonClient;
pub use config::Config;
pub use download::{DiskStorage, DownloadManager, Notifier, StderrNotifier, Storage};
pub use models::{DownloadStatus, ResumeSnapshot, StreamLink, VideoRecord};
pub use playback::{PlaybackSample, WatchTracker};
pub use store::{FileKvStore, KvStore, Library, MemoryKvStore, Session};
