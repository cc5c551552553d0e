//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Archived sessions older than this many days are pruned. Zero keeps
    /// them forever.
    pub data_retention_days: u32,
    /// Nothing is ever sent off the machine; reported by `status`.
    pub store_locally_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tabdna.db"),
            data_retention_days: 7,
            store_locally_only: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TD_DATABASE_PATH, TD_DATA_RETENTION_DAYS, ...
        figment = figment.merge(Env::prefixed("TD_"));

        figment.extract()
    }

    /// Start time before which archived sessions are pruned, or `None` when
    /// retention is unlimited.
    pub fn retention_cutoff(&self, now: i64) -> Option<i64> {
        if self.data_retention_days == 0 {
            return None;
        }
        Some(now.saturating_sub(i64::from(self.data_retention_days) * MS_PER_DAY))
    }
}

/// Returns the platform-specific config directory for tabdna.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tabdna"))
}

/// Returns the platform-specific data directory for tabdna.
///
/// On Linux: `~/.local/share/tabdna`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tabdna"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("tabdna.db"));
        assert_eq!(config.data_retention_days, 7);
        assert!(config.store_locally_only);
    }

    #[test]
    fn test_dirs_data_path_ends_with_tabdna() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tabdna");
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(
            &file,
            "database_path = \"/tmp/elsewhere.db\"\ndata_retention_days = 30\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&file)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/elsewhere.db"));
        assert_eq!(config.data_retention_days, 30);
    }

    #[test]
    fn test_retention_cutoff() {
        let config = Config {
            data_retention_days: 2,
            ..Config::default()
        };
        assert_eq!(config.retention_cutoff(3 * MS_PER_DAY), Some(MS_PER_DAY));

        let forever = Config {
            data_retention_days: 0,
            ..Config::default()
        };
        assert_eq!(forever.retention_cutoff(3 * MS_PER_DAY), None);
    }
}
