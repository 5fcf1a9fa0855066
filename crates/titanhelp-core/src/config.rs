//! Configuration for titanhelp
//!
//! Read from `titanhelp.toml`; every key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "titanhelp.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TITANHELP_CONFIG";

/// Environment variable overriding `database.path`
pub const DB_ENV: &str = "TITANHELP_DB";

/// titanhelp configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite settings
    pub database: DatabaseConfig,

    /// REST server settings
    pub api: ApiConfig,

    /// CLI display settings
    pub display: DisplayConfig,
}

/// SQLite journal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    /// Plain rollback journal, friendlier to network filesystems
    Delete,
}

impl JournalMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
        }
    }
}

/// SQLite `synchronous` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Full,
    #[default]
    Normal,
    /// No fsync at all, for throwaway test databases
    Off,
}

impl SyncMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            SyncMode::Full => "FULL",
            SyncMode::Normal => "NORMAL",
            SyncMode::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, relative to the working directory
    pub path: PathBuf,

    pub journal_mode: JournalMode,

    pub synchronous: SyncMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("titanhelp.db"),
            journal_mode: JournalMode::default(),
            synchronous: SyncMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Rows shown by `titanhelp list` when no limit is given
    pub default_limit: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            default_limit: 50,
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Resolve and load the active configuration
    ///
    /// Applies the `TITANHELP_DB` override on top of whatever file was found.
    pub fn discover() -> crate::Result<Self> {
        let mut config = match Self::find_path() {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        if let Some(db) = std::env::var_os(DB_ENV).filter(|v| !v.is_empty()) {
            config.database.path = PathBuf::from(db);
        }
        Ok(config)
    }

    /// Config file lookup: `$TITANHELP_CONFIG`, `./titanhelp.toml`, then the
    /// user config directory
    pub fn find_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::user_path().filter(|p| p.exists())
    }

    /// `~/.config/titanhelp/config.toml` or the platform equivalent
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("titanhelp").join("config.toml"))
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("failed to serialize: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# titanhelp configuration

[database]
# SQLite database file
path = "titanhelp.db"

# Journal mode: "wal" or "delete"
journal_mode = "wal"

# Durability: "full", "normal" or "off"
synchronous = "normal"

[api]
host = "127.0.0.1"
port = 5000

[display]
# Use colors in output
colors = true

# Rows shown by `titanhelp list` when no limit is given
default_limit = 50
"#
        .to_string()
    }
}
