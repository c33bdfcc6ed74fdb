//! Application settings and paths.
//!
//! Manages XDG-compliant paths and the `settings.json` defaults file.

use crate::error::{ConfigError, ConfigResult};
use crate::transport::{Timeouts, DEFAULT_PORT};
use crate::types::FormatSpec;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/s7probe)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance.
    pub fn get() -> ConfigResult<&'static Paths> {
        if let Some(paths) = PATHS.get() {
            return Ok(paths);
        }
        let paths = Self::new()?;
        Ok(PATHS.get_or_init(|| paths))
    }

    /// Resolve paths using XDG directories.
    fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "s7probe", "s7probe")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Defaults applied when a command line flag is not given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Controller address.
    pub address: String,
    /// CPU rack.
    pub rack: u16,
    /// CPU slot.
    pub slot: u16,
    /// ISO-on-TCP port.
    pub port: u16,
    /// Connection type, 0 for the transport default.
    pub connection_type: u16,
    /// Value format for read, write and poll.
    pub format: FormatSpec,
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// TCP connect plus handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Response timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Request send timeout in milliseconds.
    pub write_timeout_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            address: "127.0.0.1".to_string(),
            rack: 0,
            slot: 1,
            port: DEFAULT_PORT,
            connection_type: 0,
            format: FormatSpec::Hex,
            poll_interval_ms: 1000,
            connect_timeout_ms: timeouts.connect.as_millis() as u64,
            read_timeout_ms: timeouts.read.as_millis() as u64,
            write_timeout_ms: timeouts.write.as_millis() as u64,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if there is
    /// no settings file yet.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get()?.settings_file();

        if !file.exists() {
            debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let file = Paths::get()?.settings_file();
        self.save_to(&file)?;
        Ok(file)
    }

    /// Save settings to a specific file, creating its directory.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Transport timeouts from the millisecond fields.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
            write: Duration::from_millis(self.write_timeout_ms),
        }
    }

    /// Default poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.address, "127.0.0.1");
        assert_eq!(settings.slot, 1);
        assert_eq!(settings.port, 102);
        assert_eq!(settings.timeouts(), Timeouts::default());
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = AppSettings {
            address: "192.168.0.10".to_string(),
            format: FormatSpec::Float32,
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "address": "plc.local", "rack": 2 }"#).unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded.address, "plc.local");
        assert_eq!(loaded.rack, 2);
        assert_eq!(loaded.slot, 1);
        assert_eq!(loaded.format, FormatSpec::Hex);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
