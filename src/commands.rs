//! CLI Command Handlers
//!
//! Implements all CLI commands against the download manager and addon
//! client. Each handler takes CLI args and Output, returns ExitCode.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::AddonClient;
use crate::cli::{
    ClearCmd, Cli, DownloadCmd, ExitCode, ListCmd, Output, RemoveCmd, ResumeCmd, StreamsCmd,
    WatchCmd,
};
use crate::config::Config;
use crate::download::{DiskStorage, DownloadManager, StderrNotifier};
use crate::models::{DownloadStatus, StreamLink};
use crate::store::FileKvStore;

// =============================================================================
// Setup
// =============================================================================

/// Resolve configuration from the --config flag or the default location
pub fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path).unwrap_or_default(),
        None => Config::load(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    config
}

/// Build the download manager over the configured data directory
pub fn build_manager(config: &Config) -> anyhow::Result<DownloadManager> {
    let kv = FileKvStore::open(config.data_dir())?;
    Ok(DownloadManager::new(
        Arc::new(kv),
        Arc::new(DiskStorage),
        Arc::new(StderrNotifier),
        config.media_dir(),
    ))
}

// =============================================================================
// Download Command
// =============================================================================

pub async fn download_cmd(
    cmd: DownloadCmd,
    manager: &DownloadManager,
    output: &Output,
) -> ExitCode {
    if !cmd.url.starts_with("http://") && !cmd.url.starts_with("https://") {
        return output.error("URL must start with http:// or https://", ExitCode::InvalidArgs);
    }

    output.info(format!("Downloading: {}", cmd.title));
    let id = manager.start_download(&cmd.url, &cmd.title, cmd.thumbnail.as_deref());

    if cmd.no_wait {
        #[derive(Serialize)]
        struct Started {
            status: &'static str,
            id: Uuid,
        }
        if let Err(e) = output.print(&Started {
            status: "downloading",
            id,
        }) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
        return ExitCode::Success;
    }

    await_download(id, manager, output).await
}

// =============================================================================
// Resume Command
// =============================================================================

pub async fn resume_cmd(cmd: ResumeCmd, manager: &DownloadManager, output: &Output) -> ExitCode {
    if manager.get(cmd.id).is_none() {
        return output.error(format!("No video with id {}", cmd.id), ExitCode::NotFound);
    }

    if let Err(e) = manager.resume_download(cmd.id) {
        return output.error(e.to_string(), ExitCode::Error);
    }

    if cmd.no_wait {
        #[derive(Serialize)]
        struct Resumed {
            status: &'static str,
            id: Uuid,
        }
        if let Err(e) = output.print(&Resumed {
            status: "downloading",
            id: cmd.id,
        }) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
        return ExitCode::Success;
    }

    await_download(cmd.id, manager, output).await
}

/// Wait for the transfer to settle and report the record's terminal state
async fn await_download(id: Uuid, manager: &DownloadManager, output: &Output) -> ExitCode {
    manager.wait_idle().await;

    match manager.get(id) {
        Some(record) if record.status == DownloadStatus::Downloaded => {
            output.line(&record);
            if output.json {
                if let Err(e) = output.print(&record) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            }
            ExitCode::Success
        }
        Some(record) => {
            let reason = record
                .error_message
                .clone()
                .unwrap_or_else(|| format!("download ended with status {}", record.status));
            output.error(reason, ExitCode::DownloadFailed)
        }
        None => output.error("Record disappeared during download", ExitCode::Error),
    }
}

// =============================================================================
// List Command
// =============================================================================

pub async fn list_cmd(cmd: ListCmd, manager: &DownloadManager, output: &Output) -> ExitCode {
    let mut records = manager.list();

    if let Some(filter) = cmd.status.as_deref() {
        let Some(status) = parse_status(filter) else {
            return output.error(
                format!("Unknown status '{filter}' (downloading|paused|downloaded|error)"),
                ExitCode::InvalidArgs,
            );
        };
        records.retain(|r| r.status == status);
    }

    if output.json {
        if let Err(e) = output.print(&records) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else if records.is_empty() {
        output.info("Library is empty");
    } else {
        for record in &records {
            output.line(record);
        }
    }
    ExitCode::Success
}

fn parse_status(s: &str) -> Option<DownloadStatus> {
    match s.to_lowercase().as_str() {
        "downloading" => Some(DownloadStatus::Downloading),
        "paused" => Some(DownloadStatus::Paused),
        "downloaded" => Some(DownloadStatus::Downloaded),
        "error" => Some(DownloadStatus::Error),
        _ => None,
    }
}

// =============================================================================
// Remove Command
// =============================================================================

pub async fn remove_cmd(cmd: RemoveCmd, manager: &DownloadManager, output: &Output) -> ExitCode {
    match manager.remove_video(cmd.id) {
        Some(record) => {
            settle_deletions().await;

            #[derive(Serialize)]
            struct Removed {
                status: &'static str,
                id: Uuid,
                title: String,
            }
            if let Err(e) = output.print(&Removed {
                status: "removed",
                id: record.id,
                title: record.title,
            }) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        None => output.error(format!("No video with id {}", cmd.id), ExitCode::NotFound),
    }
}

// =============================================================================
// Clear Command
// =============================================================================

pub async fn clear_cmd(cmd: ClearCmd, manager: &DownloadManager, output: &Output) -> ExitCode {
    let count = manager.list().len();
    if count > 0 && !cmd.yes && !confirm(&format!("Remove {count} video(s) and their files?")) {
        output.info("Aborted");
        return ExitCode::Success;
    }

    let removed = manager.clear_all_videos();
    settle_deletions().await;

    #[derive(Serialize)]
    struct Cleared {
        status: &'static str,
        removed: usize,
    }
    if let Err(e) = output.print(&Cleared {
        status: "cleared",
        removed,
    }) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

fn confirm(prompt: &str) -> bool {
    use std::io::Write;
    eprint!("{prompt} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

/// File deletions run on background tasks; give them a beat to land before
/// the process exits.
async fn settle_deletions() {
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
}

// =============================================================================
// Watch Command
// =============================================================================

pub async fn watch_cmd(cmd: WatchCmd, manager: &DownloadManager, output: &Output) -> ExitCode {
    if !(0.0..=1.0).contains(&cmd.position) {
        return output.error("Position must be between 0 and 1", ExitCode::InvalidArgs);
    }

    if !manager.update_watch_progress(cmd.id, cmd.position) {
        return output.error(format!("No video with id {}", cmd.id), ExitCode::NotFound);
    }

    #[derive(Serialize)]
    struct Watched {
        status: &'static str,
        id: Uuid,
        position: f64,
    }
    if let Err(e) = output.print(&Watched {
        status: "ok",
        id: cmd.id,
        position: cmd.position,
    }) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Streams Command
// =============================================================================

pub async fn streams_cmd(cmd: StreamsCmd, config: &Config, output: &Output) -> ExitCode {
    let client = AddonClient::new(config.addon_url());

    output.info(format!("Finding streams for: {}", cmd.imdb_id));

    let result = if let (Some(season), Some(episode)) = (cmd.season, cmd.episode) {
        client.episode_streams(&cmd.imdb_id, season, episode).await
    } else {
        client.movie_streams(&cmd.imdb_id).await
    };

    match result {
        Ok(mut streams) => {
            if cmd.downloadable {
                streams.retain(|s| s.is_downloadable());
            }
            if streams.is_empty() {
                return output.error("No streams found", ExitCode::NotFound);
            }

            streams.truncate(cmd.limit);

            // Indexed for easy reference from scripts
            let indexed: Vec<IndexedStream> = streams
                .into_iter()
                .enumerate()
                .map(|(i, stream)| IndexedStream { index: i, stream })
                .collect();

            if output.json {
                if let Err(e) = output.print(&indexed) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else {
                for entry in &indexed {
                    output.line(format!("{:3}  {}", entry.index, entry.stream));
                }
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Stream fetch failed: {}", e), ExitCode::NetworkError),
    }
}

#[derive(Serialize)]
struct IndexedStream {
    index: usize,
    #[serde(flatten)]
    stream: StreamLink,
}
