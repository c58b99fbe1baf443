//! Configuration management for pamdash.
//!
//! Loads configuration from ${PAMDASH_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Refresh periods the console accepts, in seconds.
pub const REFRESH_INTERVAL_CHOICES: &[u64] = &[1, 3, 5, 10, 30];

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for pamdash configuration and log directories.
    //!
    //! PAMDASH_HOME resolution order:
    //! 1. PAMDASH_HOME environment variable (if set)
    //! 2. ~/.config/pamdash (default)
    //! 3. ./.pamdash when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the pamdash home directory.
    pub fn pamdash_home() -> PathBuf {
        if let Ok(home) = std::env::var("PAMDASH_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".pamdash"),
            |h| h.join(".config").join("pamdash"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        pamdash_home().join("config.toml")
    }

    /// Returns the directory that holds rolling log files.
    pub fn logs_dir() -> PathBuf {
        pamdash_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the security-event service.
    pub server_url: String,

    /// Poll period in seconds (one of 1, 3, 5, 10, 30).
    pub refresh_interval_secs: u64,

    /// Scheduled refreshes are skipped for this long after a user interaction.
    pub interaction_debounce_ms: u64,

    /// How long toast notifications stay on screen.
    pub toast_secs: u64,

    /// HTTP request timeout in seconds (0 uses the transport default).
    pub request_timeout_secs: u64,

    /// Tracing filter directive (overridden by PAMDASH_LOG).
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: Self::DEFAULT_SERVER_URL.to_string(),
            refresh_interval_secs: Self::DEFAULT_REFRESH_INTERVAL_SECS,
            interaction_debounce_ms: Self::DEFAULT_INTERACTION_DEBOUNCE_MS,
            toast_secs: Self::DEFAULT_TOAST_SECS,
            request_timeout_secs: 0,
            log_filter: None,
        }
    }
}

impl Config {
    const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
    const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;
    const DEFAULT_INTERACTION_DEBOUNCE_MS: u64 = 5_000;
    const DEFAULT_TOAST_SECS: u64 = 5;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Config::default()
        };
        config
            .validate()
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        Ok(config)
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Checks values that serde cannot express.
    ///
    /// # Errors
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_refresh_interval(self.refresh_interval_secs)?;
        if self.server_url.trim().is_empty() {
            bail!("server_url must not be empty");
        }
        url::Url::parse(&self.server_url)
            .with_context(|| format!("server_url is not a valid URL: {}", self.server_url))?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn interaction_debounce(&self) -> Duration {
        Duration::from_millis(self.interaction_debounce_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }
}

/// Rejects refresh periods outside [`REFRESH_INTERVAL_CHOICES`].
///
/// # Errors
/// Returns an error listing the accepted values.
pub fn validate_refresh_interval(secs: u64) -> Result<()> {
    if REFRESH_INTERVAL_CHOICES.contains(&secs) {
        Ok(())
    } else {
        bail!("refresh interval must be one of 1, 3, 5, 10 or 30 seconds (got {secs})")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.refresh_interval_secs, 5);
        assert_eq!(config.interaction_debounce(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "server_url = \"http://10.0.0.5:8080\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.server_url, "http://10.0.0.5:8080");
        assert_eq!(config.toast_secs, 5);
    }

    #[test]
    fn test_load_rejects_unsupported_interval() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "refresh_interval_secs = 7\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("refresh interval"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("server_url"));
        let parsed: Config = toml::from_str(&contents).unwrap();
        assert_eq!(parsed.refresh_interval_secs, 5);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_request_timeout_zero_means_transport_default() {
        let config = Config {
            request_timeout_secs: 3,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(3)));
    }
}
