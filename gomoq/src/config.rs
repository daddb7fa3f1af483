use std::path::{Path, PathBuf};
use std::time::Duration;

use gomoq_gen::{DEFAULT_MATCHERS_DIR, DEFAULT_RUNTIME_IMPORT};
use log::debug;
use serde::Deserialize;

use crate::error::GomoqError;

/// Name of the optional configuration file in the working directory.
pub const CONFIG_FILE: &str = "gomoq.toml";

/// Settings read from `gomoq.toml`. Command line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Import path of the mocking runtime.
    pub runtime_import: String,
    /// The `go` executable used by the reflect-based model generator.
    pub go_binary: String,
    pub watch_interval_ms: u64,
    /// Matchers directory, relative to the mock's directory.
    pub matchers_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime_import: DEFAULT_RUNTIME_IMPORT.to_string(),
            go_binary: "go".to_string(),
            watch_interval_ms: 2000,
            matchers_dir: PathBuf::from(DEFAULT_MATCHERS_DIR),
        }
    }
}

impl Config {
    /// Reads `gomoq.toml` from `dir`, falling back to the defaults when the
    /// file does not exist.
    pub fn load(dir: &Path) -> Result<Self, GomoqError> {
        let path = dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no {CONFIG_FILE} in {}, using defaults", dir.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(GomoqError::io(path, err)),
        };
        Self::parse(&content).map_err(|source| GomoqError::Config { path, source })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Config>(content)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.go_binary, "go");
        assert_eq!(config.watch_interval(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            runtime_import = "example.com/fork/pegomock"
            watch_interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                runtime_import: "example.com/fork/pegomock".to_string(),
                watch_interval_ms: 500,
                ..Config::default()
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "go_bin = \"go1.22\"\n").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, GomoqError::Config { .. }), "{err:?}");
    }
}
