use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trackdrop")]
#[command(about = "Imports GPS tracks from field devices into search operations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new operation
    NewOperation {
        /// Letters, digits and spaces, 2 to 50 characters
        #[arg(long)]
        name: String,
        /// Operation start (RFC 3339, or "now")
        #[arg(long, value_parser = parse_start, default_value = "now")]
        start: DateTime<Utc>,
        /// Number of search areas (0 disables area checks)
        #[arg(long, default_value_t = 0)]
        areas: u32,
    },
    /// List operations, newest first
    ListOperations,
    /// Watch for GPS devices and annotate imported tracks
    Watch {
        /// Operation to import into (default: newest)
        #[arg(long)]
        operation: Option<String>,
    },
    /// Import a single track file
    Import {
        file: PathBuf,
        /// Operation to import into (default: newest)
        #[arg(long)]
        operation: Option<String>,
    },
    /// Change an operation's start time
    SetStart {
        #[arg(long)]
        operation: String,
        #[arg(long, value_parser = parse_start)]
        start: DateTime<Utc>,
    },
    /// Mirror an operation to an additional directory
    AddStoragePath {
        #[arg(long)]
        operation: String,
        #[arg(long)]
        path: PathBuf,
    },
    /// Print configuration values
    PrintConfig,
}

fn parse_start(value: &str) -> Result<DateTime<Utc>, String> {
    if value.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| format!("expected RFC 3339 time or \"now\": {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_start_accepts_offsets() {
        assert_eq!(
            parse_start("2024-06-01T12:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
        assert!(parse_start("NOW").is_ok());
        assert!(parse_start("yesterday").is_err());
    }

    #[test]
    fn test_cli_parses_new_operation() {
        let cli = Cli::parse_from([
            "trackdrop",
            "new-operation",
            "--name",
            "Leting Nord",
            "--start",
            "2024-06-01T10:00:00Z",
            "--areas",
            "6",
        ]);
        match cli.command {
            Some(Commands::NewOperation { name, areas, .. }) => {
                assert_eq!(name, "Leting Nord");
                assert_eq!(areas, 6);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
