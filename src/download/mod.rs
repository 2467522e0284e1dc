//! Download engine: resumable transfers and the coordinator that drives them.

pub mod manager;
pub mod transfer;

pub use manager::{DiskStorage, DownloadManager, Notifier, StderrNotifier, Storage};
pub use transfer::{HttpTransfer, TransferError, TransferHandle};
