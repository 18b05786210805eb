use negotiator::{ClientCredentials, RetryConfig};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System-wide configuration file, as deployed by Perun.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/perun/services/bbmri_negotiator/bbmri_negotiator.toml";

/// Fields every configuration file must define.
pub const EXPECTED_FIELDS: [&str; 5] = [
    "client_id",
    "client_secret",
    "resource",
    "token_url",
    "api_url",
];

/// Errors raised while locating or reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration file found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("could not read configuration {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "invalid configuration {}: {message}. Expected {:?} fields",
        .path.display(),
        EXPECTED_FIELDS
    )]
    Invalid { path: PathBuf, message: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Config Schema
// ============================================================================

/// Credentials and endpoints for the Negotiator.
#[derive(Clone, Deserialize)]
pub struct SyncConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Audience sent with the token request
    pub resource: String,
    pub token_url: String,
    pub api_url: String,

    /// Transport retry policy
    #[serde(default)]
    pub retry: RetrySettings,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("resource", &self.resource)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("retry", &self.retry)
            .finish()
    }
}

/// `[retry]` table. Defaults: 3 attempts, 2s base delay doubling, 2 minute cap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay_ms: defaults.base_delay.as_millis() as u64,
            backoff_factor: defaults.backoff_factor,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            backoff_factor: settings.backoff_factor,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl SyncConfig {
    /// Locate and load the configuration.
    ///
    /// An explicit path (from `--config` or the environment) is the only
    /// candidate when given. Otherwise the system path is tried first, then
    /// `~/.config/negotiator-sync/config.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let candidates = match explicit {
            Some(path) => vec![expand_path(path)],
            None => default_paths(),
        };

        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                searched: candidates.clone(),
            })?;

        let config = Self::from_file(&path)?;
        Ok((config, path))
    }

    /// Load a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse and validate configuration content read from `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Self = toml::from_str(content).map_err(|e| invalid(e.to_string()))?;

        let required = [
            ("client_id", &config.client_id),
            ("client_secret", &config.client_secret),
            ("token_url", &config.token_url),
            ("api_url", &config.api_url),
        ];
        let empty: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !empty.is_empty() {
            return Err(invalid(format!("empty value for {}", empty.join(", "))));
        }

        let factor = config.retry.backoff_factor;
        if !factor.is_finite() || factor < 1.0 {
            return Err(invalid(format!(
                "retry.backoff_factor must be a finite number of at least 1.0, got {factor}"
            )));
        }

        config.api_url = config.api_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Credentials for the token endpoint.
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            resource: self.resource.clone(),
            token_url: self.token_url.clone(),
        }
    }

    /// Transport retry policy.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from(&self.retry)
    }
}

/// Default search path, in lookup order.
fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(home) = dirs::home_dir() {
        paths.push(
            home.join(".config")
                .join("negotiator-sync")
                .join("config.toml"),
        );
    }
    paths
}

/// Expand `~` in a user-supplied path.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}
