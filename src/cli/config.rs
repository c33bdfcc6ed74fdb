//! Config subcommand implementation.
//!
//! Handles `s7probe config show|path|init` for the settings file.

use crate::config::{AppSettings, Paths};
use crate::error::{CliError, CliResult, ConfigError};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Inspect or create the settings file.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Settings file actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings as JSON
    Show,

    /// Print the settings file location
    Path,

    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command. `explicit` is the `--config` path, if any.
    pub fn execute<W: Write>(&self, explicit: Option<&Path>, mut out: W) -> CliResult<()> {
        match &self.action {
            ConfigAction::Show => {
                let settings = match explicit {
                    Some(path) => AppSettings::load_from(path)?,
                    None => AppSettings::load()?,
                };
                let json = serde_json::to_string_pretty(&settings).map_err(ConfigError::from)?;
                writeln!(out, "{}", json)?;
            }
            ConfigAction::Path => {
                writeln!(out, "{}", settings_path(explicit)?.display())?;
            }
            ConfigAction::Init { force } => {
                let path = settings_path(explicit)?;
                if path.exists() && !force {
                    return Err(CliError::InvalidArgument(format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    )));
                }
                AppSettings::default().save_to(&path)?;
                writeln!(out, "Wrote default settings to {}", path.display())?;
            }
        }
        Ok(())
    }
}

fn settings_path(explicit: Option<&Path>) -> CliResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Paths::get()?.settings_file()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run(action: ConfigAction, path: &Path) -> CliResult<String> {
        let mut out = Vec::new();
        ConfigCommand { action }.execute(Some(path), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_init_then_show() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let msg = run(ConfigAction::Init { force: false }, &path).unwrap();
        assert!(msg.starts_with("Wrote default settings"));

        let shown = run(ConfigAction::Show, &path).unwrap();
        let parsed: AppSettings = serde_json::from_str(&shown).unwrap();
        assert_eq!(parsed, AppSettings::default());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(matches!(
            run(ConfigAction::Init { force: false }, &path),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(run(ConfigAction::Init { force: true }, &path).is_ok());
    }

    #[test]
    fn test_path_prints_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let shown = run(ConfigAction::Path, &path).unwrap();
        assert_eq!(shown.trim(), path.display().to_string());
    }
}
