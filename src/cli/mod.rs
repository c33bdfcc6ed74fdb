//! CLI subcommand definitions and handlers.
//!
//! Implements a subcommand architecture:
//! - `s7probe read` - One-shot read from an area
//! - `s7probe write` - Write data to an area
//! - `s7probe poll` - Repeated read with interval
//! - `s7probe config show|path|init` - Manage the settings file

mod args;
mod config;
mod poll;
mod read;
mod write;

pub use args::{parse_duration, parse_tsap, AreaArgs, ConnectionArgs};
pub use config::{ConfigAction, ConfigCommand};
pub use poll::PollCommand;
pub use read::ReadCommand;
pub use write::WriteCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::poll::CancelFlag;
use crate::transport::Connector;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// s7probe - read, write and poll Siemens S7 PLC memory.
///
/// Talks ISO-on-TCP to S7-300/400/1200/1500 CPUs and compatible devices.
/// Connection defaults come from the settings file and can be overridden
/// per command.
#[derive(Parser, Debug)]
#[command(name = "s7probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read, write and poll S7 PLC memory areas", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// One-shot read from an area
    #[command(alias = "r")]
    Read(ReadCommand),

    /// Write data to an area
    #[command(alias = "w")]
    Write(WriteCommand),

    /// Repeated read with interval
    #[command(alias = "p")]
    Poll(PollCommand),

    /// Inspect or create the settings file
    Config(ConfigCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// One JSON object per line
    Json,
    /// CSV with a header row
    Csv,
}

/// What a data command needs besides its own flags.
pub struct CommandContext<'a> {
    /// Defaults for flags that were not given.
    pub settings: AppSettings,
    /// Opens the session.
    pub connector: &'a dyn Connector,
    /// Suppress non-essential output.
    pub quiet: bool,
}

impl Cli {
    /// Load settings from `--config` or the default location.
    pub fn load_settings(&self) -> CliResult<AppSettings> {
        let settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };
        Ok(settings)
    }

    /// Run the selected command, writing results to `out`.
    pub async fn run<W: Write>(&self, connector: &dyn Connector, out: W) -> CliResult<()> {
        match &self.command {
            Commands::Read(cmd) => cmd.execute(&self.context(connector)?, out).await,
            Commands::Write(cmd) => cmd.execute(&self.context(connector)?, out).await,
            Commands::Poll(cmd) => {
                let ctx = self.context(connector)?;
                let cancel = CancelFlag::new();
                let watcher = tokio::spawn(poll::cancel_on_interrupt(cancel.clone()));
                let result = cmd.execute(&ctx, &cancel, out).await;
                watcher.abort();
                result
            }
            Commands::Config(cmd) => cmd.execute(self.config.as_deref(), out),
        }
    }

    fn context<'a>(&self, connector: &'a dyn Connector) -> CliResult<CommandContext<'a>> {
        Ok(CommandContext {
            settings: self.load_settings()?,
            connector,
            quiet: self.quiet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AreaError, CliError, CodecError, TransportError};
    use crate::transport::MemoryPlc;
    use crate::types::AreaKind;
    use tempfile::TempDir;

    /// Parse a command line with a settings file that holds only defaults.
    fn parse(dir: &TempDir, args: &[&str]) -> Cli {
        let path = dir.path().join("settings.json");
        AppSettings::default().save_to(&path).unwrap();

        let mut argv = vec!["s7probe", "--config", path.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    async fn run(plc: &MemoryPlc, args: &[&str]) -> (CliResult<()>, String) {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&dir, args);
        let mut out = Vec::new();
        let result = cli.run(plc, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    fn db1() -> MemoryPlc {
        MemoryPlc::new().with_area(AreaKind::DataBlock, 1, vec![1, 2, 3, 4, 0, 0, 0, 0])
    }

    #[tokio::test]
    async fn test_read_int16() {
        let plc = db1();
        let (result, out) = run(&plc, &["read", "--format", "int16"]).await;
        result.unwrap();
        assert_eq!(out, "258,772\n");
        assert_eq!(plc.close_count(), 1);
    }

    #[tokio::test]
    async fn test_read_defaults_to_hex() {
        let plc = db1();
        let (result, out) = run(&plc, &["read"]).await;
        result.unwrap();
        assert_eq!(out, "01 02 03 04\n");
    }

    #[tokio::test]
    async fn test_read_json() {
        let plc = db1();
        let (result, out) = run(&plc, &["read", "--size", "2", "--output", "json"]).await;
        result.unwrap();

        let json: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(json["value"], "01 02");
        assert_eq!(json["size"], 2);
        assert_eq!(json["sequence"], 1);
    }

    #[tokio::test]
    async fn test_read_alignment_error_after_close() {
        let plc = db1();
        let (result, out) = run(&plc, &["read", "--size", "3", "--format", "int32"]).await;
        assert!(matches!(
            result,
            Err(CliError::Codec(CodecError::Alignment { .. }))
        ));
        assert!(out.is_empty());
        assert_eq!(plc.close_count(), 1);
    }

    #[tokio::test]
    async fn test_read_transport_error_closes_session() {
        let plc = db1();
        let (result, _) = run(&plc, &["read", "--db", "7"]).await;
        assert!(matches!(
            result,
            Err(CliError::Engine(_))
        ));
        assert_eq!(plc.session_count(), 1);
        assert_eq!(plc.close_count(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_area_never_connects() {
        let plc = db1();
        let (result, _) = run(&plc, &["read", "--area", "TM"]).await;
        assert!(matches!(
            result,
            Err(CliError::Area(AreaError::UnsupportedArea { .. }))
        ));
        assert_eq!(plc.session_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_format_never_connects() {
        let plc = db1();
        let (result, _) = run(&plc, &["read", "--format", "bcd"]).await;
        assert!(matches!(
            result,
            Err(CliError::Codec(CodecError::UnsupportedFormat(_)))
        ));
        assert_eq!(plc.session_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let plc = db1().refusing_connections();
        let (result, out) = run(&plc, &["read"]).await;
        assert!(matches!(
            result,
            Err(CliError::Transport(TransportError::Connect { .. }))
        ));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_write_float32() {
        let plc = db1();
        let (result, out) = run(
            &plc,
            &["write", "--size", "8", "--format", "float32", "--values", "1.5,2.25"],
        )
        .await;
        result.unwrap();

        assert_eq!(out, "Wrote 8 bytes to DB1.DBB0\n");
        assert_eq!(
            plc.bytes(AreaKind::DataBlock, 1),
            vec![0x3F, 0xC0, 0x00, 0x00, 0x40, 0x10, 0x00, 0x00]
        );
        assert_eq!(plc.close_count(), 1);
    }

    #[tokio::test]
    async fn test_write_quiet() {
        let plc = db1();
        let (result, out) = run(&plc, &["-q", "write", "--start", "4", "--values", "0xAA 0xBB"]).await;
        result.unwrap();
        assert!(out.is_empty());
        assert_eq!(
            plc.bytes(AreaKind::DataBlock, 1),
            vec![1, 2, 3, 4, 0xAA, 0xBB, 0, 0]
        );
    }

    #[tokio::test]
    async fn test_write_bad_hex_never_connects() {
        let plc = db1();
        let (result, _) = run(&plc, &["write", "--values", "ABC"]).await;
        assert!(matches!(
            result,
            Err(CliError::Codec(CodecError::MalformedInput(_)))
        ));
        assert_eq!(plc.session_count(), 0);
    }

    #[tokio::test]
    async fn test_write_requires_values() {
        let plc = db1();
        let (result, _) = run(&plc, &["write", "--values", ""]).await;
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
        assert_eq!(plc.session_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_plain_with_timestamps() {
        let plc = db1();
        let (result, out) = run(
            &plc,
            &["poll", "--count", "2", "--interval", "500ms", "--format", "int16"],
        )
        .await;
        result.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(line.starts_with('['));
            assert!(line.ends_with("] 258,772"));
        }
        assert_eq!(plc.read_count(), 2);
        assert_eq!(plc.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_keeps_prior_samples() {
        let plc = db1();
        plc.fail_reads_after(1);
        let (result, out) = run(&plc, &["poll", "--interval", "1s", "--output", "csv"]).await;

        assert!(matches!(result, Err(CliError::Poll(_))));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("timestamp,sequence"));
        assert!(lines[1].ends_with(",1,DB,1,0,4,hex,01 02 03 04"));
        assert_eq!(plc.close_count(), 1);
    }

    #[tokio::test]
    async fn test_poll_zero_interval_rejected() {
        let plc = db1();
        let (result, _) = run(&plc, &["poll", "--interval", "0"]).await;
        assert!(matches!(result, Err(CliError::Poll(_))));
        assert_eq!(plc.session_count(), 0);
    }

    #[test]
    fn test_tsap_flags_must_be_paired() {
        let result = Cli::try_parse_from(["s7probe", "read", "--local-tsap", "0100"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "s7probe",
            "read",
            "--local-tsap",
            "0100",
            "--remote-tsap",
            "0x0200",
        ])
        .unwrap();
        match cli.command {
            Commands::Read(cmd) => {
                assert_eq!(cmd.connection.local_tsap, Some(0x0100));
                assert_eq!(cmd.connection.remote_tsap, Some(0x0200));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
