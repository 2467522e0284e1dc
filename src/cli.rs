//! CLI - Command Line Interface for vidstash
//!
//! Designed for scripting and automation around the download engine.
//! All output is JSON-parseable with --json (default for non-TTY).
//!
//! # Examples
//!
//! ```bash
//! # Download a video and wait for it
//! vidstash download https://cdn.example/movie.mp4 --title "Movie"
//!
//! # Inspect and manage the library
//! vidstash list --json
//! vidstash remove 0b29a6f3-...
//!
//! # Record playback position
//! vidstash watch 0b29a6f3-... 0.45
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;
use uuid::Uuid;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Record not found
    NotFound = 4,
    /// Download failed
    DownloadFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// vidstash - offline downloads and watch progress for streamed media
#[derive(Parser, Debug)]
#[command(
    name = "vidstash",
    version,
    about = "Offline downloads and watch progress for streamed media",
    long_about = "Downloads videos for offline playback, remembers how far you \
                  watched each one, and survives restarts: interrupted \
                  downloads come back paused and can be resumed.",
    after_help = "EXAMPLES:\n\
                  vidstash download https://cdn.example/m.mp4 -t \"Movie\"\n\
                  vidstash list --json\n\
                  vidstash watch 0b29a6f3-6a70-4d2c-8f1e-bd6c2f9e13a7 0.45\n\
                  vidstash streams tt0903747 -s 1 -e 3"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Directory for persisted state (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a video and wait for it to finish
    #[command(visible_alias = "dl")]
    Download(DownloadCmd),

    /// Resume a paused download
    #[command(visible_alias = "r")]
    Resume(ResumeCmd),

    /// List the library, most recently touched first
    #[command(visible_alias = "ls")]
    List(ListCmd),

    /// Remove a video and delete its files
    #[command(visible_alias = "rm")]
    Remove(RemoveCmd),

    /// Remove every video and delete all files
    Clear(ClearCmd),

    /// Record a playback position for a video
    #[command(visible_alias = "w")]
    Watch(WatchCmd),

    /// Resolve available stream links for content
    #[command(visible_alias = "st")]
    Streams(StreamsCmd),
}

// =============================================================================
// Download Command
// =============================================================================

/// Download a video from a direct URL
#[derive(Args, Debug)]
pub struct DownloadCmd {
    /// Source URL of the media
    #[arg(required = true)]
    pub url: String,

    /// Display title for the record
    #[arg(long, short = 't', required = true)]
    pub title: String,

    /// Thumbnail URL to cache alongside the media
    #[arg(long)]
    pub thumbnail: Option<String>,

    /// Return immediately instead of waiting for completion
    #[arg(long)]
    pub no_wait: bool,
}

// =============================================================================
// Resume Command
// =============================================================================

/// Resume a paused download from its partial file
#[derive(Args, Debug)]
pub struct ResumeCmd {
    /// Record id (UUID from `list` output)
    #[arg(required = true)]
    pub id: Uuid,

    /// Return immediately instead of waiting for completion
    #[arg(long)]
    pub no_wait: bool,
}

// =============================================================================
// List Command
// =============================================================================

/// List library records
#[derive(Args, Debug)]
pub struct ListCmd {
    /// Only show records with this status
    #[arg(long, short = 's')]
    pub status: Option<String>,
}

// =============================================================================
// Remove / Clear Commands
// =============================================================================

/// Remove one video: cancel its transfer, delete files, drop the record
#[derive(Args, Debug)]
pub struct RemoveCmd {
    /// Record id (UUID from `list` output)
    #[arg(required = true)]
    pub id: Uuid,
}

/// Remove every video
#[derive(Args, Debug)]
pub struct ClearCmd {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

// =============================================================================
// Watch Command
// =============================================================================

/// Record a playback position for a video
#[derive(Args, Debug)]
pub struct WatchCmd {
    /// Record id (UUID from `list` output)
    #[arg(required = true)]
    pub id: Uuid,

    /// Normalized position in [0, 1]
    #[arg(required = true)]
    pub position: f64,
}

// =============================================================================
// Streams Command
// =============================================================================

/// Resolve stream links for a movie or TV episode
#[derive(Args, Debug)]
pub struct StreamsCmd {
    /// IMDB ID (e.g., tt1877830)
    #[arg(required = true)]
    pub imdb_id: String,

    /// Season number (for TV shows)
    #[arg(long, short = 's')]
    pub season: Option<u16>,

    /// Episode number (for TV shows)
    #[arg(long, short = 'e')]
    pub episode: Option<u16>,

    /// Only show directly downloadable links
    #[arg(long, short = 'd')]
    pub downloadable: bool,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print a preformatted line (non-JSON mode only)
    pub fn line(&self, msg: impl std::fmt::Display) {
        if !self.json {
            println!("{}", msg);
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// IMDB ID Validation
// =============================================================================

/// Validate IMDB ID format (tt followed by digits)
pub fn validate_imdb_id(id: &str) -> Result<&str, &'static str> {
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Ok(id)
    } else {
        Err("Invalid IMDB ID format (expected tt followed by 7+ digits)")
    }
}

// =============================================================================
// Tests
// =============================================================================
