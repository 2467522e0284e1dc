//! Resumable HTTP transfer primitive
//!
//! Streams a response body to disk with per-chunk progress reporting and
//! cooperative cancellation. A transfer restarted over an existing partial
//! file asks the server for the remaining bytes with a `Range` request and
//! appends on `206 Partial Content`; a server that answers `200 OK` instead
//! gets a clean restart.
//!
//! Cancellation is a shared flag checked at every chunk boundary; the
//! transfer stops at the next chunk, never mid-write.

use futures::StreamExt;
use reqwest::header::RANGE;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

// =============================================================================
// Errors
// =============================================================================

/// Failure modes of a media or thumbnail transfer
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("transfer cancelled")]
    Cancelled,
}

// =============================================================================
// Transfer Handle
// =============================================================================

/// Cancellation handle for one in-flight transfer. Cloned into the transfer
/// task; cancelling flips a shared flag the transfer checks per chunk.
#[derive(Debug, Clone, Default)]
pub struct TransferHandle {
    cancelled: Arc<AtomicBool>,
}

impl TransferHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the transfer stop at the next chunk boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// HTTP Transfer
// =============================================================================

/// One streaming download: source URL to destination path.
pub struct HttpTransfer {
    client: reqwest::Client,
    url: String,
    dest: PathBuf,
}

impl HttpTransfer {
    pub fn new(client: reqwest::Client, url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            client,
            url: url.into(),
            dest: dest.into(),
        }
    }

    /// Run the transfer to completion, reporting `(bytes_on_disk, total)`
    /// after every chunk. Resumes from an existing partial file when the
    /// server supports ranged requests. Returns total bytes on disk.
    pub async fn run(
        &self,
        handle: &TransferHandle,
        mut on_progress: impl FnMut(u64, Option<u64>),
    ) -> Result<u64, TransferError> {
        if handle.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let offset = tokio::fs::metadata(&self.dest)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        let mut request = self.client.get(&self.url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        let response = request.send().await?;

        let status = response.status();
        let resuming = offset > 0 && status == StatusCode::PARTIAL_CONTENT;
        if !resuming && !status.is_success() {
            return Err(TransferError::Status(status));
        }

        let start = if resuming { offset } else { 0 };
        let total = response.content_length().map(|remaining| start + remaining);

        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(resuming)
            .truncate(!resuming)
            .open(&self.dest)
            .await?;

        let mut written = start;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if handle.is_cancelled() {
                // Leave the partial file for a later resume; removal cleans
                // it up through the storage boundary.
                return Err(TransferError::Cancelled);
            }
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            on_progress(written, total);
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Percentage of a transfer, when the total is known and non-zero.
pub fn percent(written: u64, total: Option<u64>) -> Option<f64> {
    let total = total.filter(|t| *t > 0)?;
    Some((written as f64 / total as f64) * 100.0)
}

// =============================================================================
// Thumbnail Fetch
// =============================================================================

/// One-shot fetch of a small file (thumbnails). No resume, no progress.
pub async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), TransferError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::Status(status));
    }
    let bytes = response.bytes().await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &bytes).await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, Some(100)), Some(50.0));
        assert_eq!(percent(100, Some(100)), Some(100.0));
        assert_eq!(percent(0, Some(100)), Some(0.0));
        // Unknown or empty totals yield no percentage
        assert_eq!(percent(50, None), None);
        assert_eq!(percent(50, Some(0)), None);
    }

    #[test]
    fn test_handle_cancel_flag() {
        let handle = TransferHandle::new();
        assert!(!handle.is_cancelled());

        let observer = handle.clone();
        handle.cancel();
        assert!(observer.is_cancelled());
    }

    #[tokio::test]
    async fn test_precancelled_transfer_never_connects() {
        let handle = TransferHandle::new();
        handle.cancel();

        // Port is never contacted: a pre-cancelled transfer fails immediately
        let transfer = HttpTransfer::new(
            reqwest::Client::new(),
            "http://127.0.0.1:59999/never.mp4",
            std::env::temp_dir().join("vidstash-never.mp4"),
        );
        let result = transfer.run(&handle, |_, _| {}).await;
        assert!(matches!(result, Err(TransferError::Cancelled)));
    }
}
