//! CLI Tests
//!
//! Tests for argument parsing, JSON output shape, and exit code semantics.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use uuid::Uuid;
    use vidstash::cli::{Cli, Command};

    #[test]
    fn test_download_command_basic() {
        let cli = Cli::parse_from([
            "vidstash",
            "download",
            "https://cdn.example/m.mp4",
            "--title",
            "Movie",
        ]);
        match cli.command {
            Command::Download(cmd) => {
                assert_eq!(cmd.url, "https://cdn.example/m.mp4");
                assert_eq!(cmd.title, "Movie");
                assert!(cmd.thumbnail.is_none());
                assert!(!cmd.no_wait);
            }
            _ => panic!("Expected Download command"),
        }
    }

    #[test]
    fn test_download_alias_and_flags() {
        let cli = Cli::parse_from([
            "vidstash",
            "dl",
            "https://cdn.example/m.mp4",
            "-t",
            "Movie",
            "--thumbnail",
            "https://cdn.example/m.jpg",
            "--no-wait",
        ]);
        match cli.command {
            Command::Download(cmd) => {
                assert_eq!(cmd.thumbnail.as_deref(), Some("https://cdn.example/m.jpg"));
                assert!(cmd.no_wait);
            }
            _ => panic!("Expected Download command"),
        }
    }

    #[test]
    fn test_list_with_status_filter() {
        let cli = Cli::parse_from(["vidstash", "list", "-s", "paused"]);
        match cli.command {
            Command::List(cmd) => assert_eq!(cmd.status.as_deref(), Some("paused")),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_remove_parses_uuid() {
        let id = Uuid::new_v4();
        let cli = Cli::parse_from(["vidstash", "remove", &id.to_string()]);
        match cli.command {
            Command::Remove(cmd) => assert_eq!(cmd.id, id),
            _ => panic!("Expected Remove command"),
        }
    }

    #[test]
    fn test_clear_confirmation_flag() {
        let cli = Cli::parse_from(["vidstash", "clear", "--yes"]);
        match cli.command {
            Command::Clear(cmd) => assert!(cmd.yes),
            _ => panic!("Expected Clear command"),
        }
    }

    #[test]
    fn test_watch_position() {
        let id = Uuid::new_v4();
        let cli = Cli::parse_from(["vidstash", "watch", &id.to_string(), "0.75"]);
        match cli.command {
            Command::Watch(cmd) => {
                assert_eq!(cmd.id, id);
                assert_eq!(cmd.position, 0.75);
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_streams_defaults() {
        let cli = Cli::parse_from(["vidstash", "streams", "tt1877830"]);
        match cli.command {
            Command::Streams(cmd) => {
                assert_eq!(cmd.imdb_id, "tt1877830");
                assert!(cmd.season.is_none());
                assert!(cmd.episode.is_none());
                assert!(!cmd.downloadable);
                assert_eq!(cmd.limit, 20); // default
            }
            _ => panic!("Expected Streams command"),
        }
    }

    #[test]
    fn test_global_data_dir() {
        let cli = Cli::parse_from(["vidstash", "--data-dir", "/tmp/state", "list"]);
        assert_eq!(
            cli.data_dir.as_deref(),
            Some(std::path::Path::new("/tmp/state"))
        );
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["vidstash"]).is_err());
    }
}

// =============================================================================
// JSON Output Tests
// =============================================================================

mod json_output {
    use vidstash::cli::{ExitCode, JsonOutput};

    #[test]
    fn test_success_shape() {
        let output = JsonOutput::success(vec!["a", "b"]);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["data"][0], "a");
        assert!(json.get("error").is_none());
        // exit_code omitted when zero
        assert!(json.get("exit_code").is_none());
    }

    #[test]
    fn test_error_shape() {
        let output = JsonOutput::<()>::error_msg("no video", ExitCode::NotFound);
        let json = serde_json::to_value(&output).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["error"], "no video");
        assert_eq!(json["exit_code"], 4);
    }
}
