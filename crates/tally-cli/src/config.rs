//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tally_core::{ScanConfig, SpanPolicy};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Defaults for `scan` and `import`; command-line flags layer on top.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Midnight rollover thresholds used while parsing.
    #[serde(default)]
    pub span: SpanPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("max_depth", &self.scan.max_depth)
            .field("max_file_size", &self.scan.max_file_size)
            .field("include_patterns", &self.scan.include_patterns.len())
            .field("exclude_patterns", &self.scan.exclude_patterns.len())
            .field("span", &self.span)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tally.db"),
            scan: ScanConfig::default(),
            span: SpanPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: built-in defaults, then `config.toml` in the
    /// platform config directory, then `config_path`, then `TALLY_*`
    /// environment variables (`__` separates nested keys, as in
    /// `TALLY_SCAN__MAX_DEPTH`).
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

        figment = figment.merge(Env::prefixed("TALLY_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for tally.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally"))
}

/// Returns the platform-specific data directory for tally.
///
/// On Linux: `~/.local/share/tally`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tally"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_tally() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tally");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("tally.db"));
        assert_eq!(config.scan, ScanConfig::default());
        assert_eq!(config.span, SpanPolicy::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tally.toml");
        std::fs::write(
            &path,
            r#"
database_path = "/tmp/elsewhere.db"

[scan]
max_depth = 3
exclude_patterns = ["archive"]

[span]
max_rollover_minutes = 900
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/elsewhere.db"));
        assert_eq!(config.scan.max_depth, 3);
        assert_eq!(config.scan.exclude_patterns, vec!["archive"]);
        assert_eq!(config.scan.max_file_size, ScanConfig::default().max_file_size);
        assert_eq!(config.span.max_rollover_minutes, 900);
        assert_eq!(
            config.span.suspicious_rollover_minutes,
            SpanPolicy::default().suspicious_rollover_minutes
        );
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tally.toml");
        std::fs::write(&path, "[scan]\nmax_depth = \"deep\"\n").unwrap();

        assert!(Config::load_from(Some(&path)).is_err());
    }
}
