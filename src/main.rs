//! vidstash - offline downloads and watch progress for streamed media
//!
//! # Usage
//!
//! ```bash
//! vidstash download https://cdn.example/movie.mp4 --title "Movie"
//! vidstash list --json
//! vidstash watch <id> 0.45
//! vidstash streams tt0903747 -s 1 -e 3
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vidstash::cli::{self, Cli, Command, ExitCode, Output};
use vidstash::commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vidstash=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = commands::load_config(&cli);

    match cli.command {
        // Streams only talks to the addon; no manager needed
        Command::Streams(cmd) => {
            if let Err(e) = cli::validate_imdb_id(&cmd.imdb_id) {
                return output.error(e, ExitCode::InvalidArgs);
            }
            commands::streams_cmd(cmd, &config, &output).await
        }

        command => {
            let manager = match commands::build_manager(&config) {
                Ok(manager) => manager,
                Err(e) => {
                    return output.error(format!("Failed to open data dir: {e}"), ExitCode::Error)
                }
            };

            match command {
                Command::Download(cmd) => commands::download_cmd(cmd, &manager, &output).await,
                Command::Resume(cmd) => commands::resume_cmd(cmd, &manager, &output).await,
                Command::List(cmd) => commands::list_cmd(cmd, &manager, &output).await,
                Command::Remove(cmd) => commands::remove_cmd(cmd, &manager, &output).await,
                Command::Clear(cmd) => commands::clear_cmd(cmd, &manager, &output).await,
                Command::Watch(cmd) => commands::watch_cmd(cmd, &manager, &output).await,
                Command::Streams(_) => unreachable!(),
            }
        }
    }
}
