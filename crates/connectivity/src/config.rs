use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const MIN_PROBE_TIMEOUT_MS: u64 = 100;
const MAX_PROBE_TIMEOUT_MS: u64 = 300_000; // 5 minutes
const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: path::PathBuf, source: std::io::Error },
    #[error("failed to write config file {path}: {source}")]
    Write { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no config directory available (XDG_CONFIG_HOME and HOME are unset)")]
    ConfigPathUnavailable,
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// HTTP method used by the reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    Get,
    Head,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Get => write!(f, "GET"),
            ProbeMethod::Head => write!(f, "HEAD"),
        }
    }
}

/// Monitor configuration.
///
/// Keys are camelCase on disk (`pollIntervalMs`, `probeTimeoutMs`,
/// `apiHealthPath`, ...). Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    pub api_base_url: String,
    pub api_health_path: String,
    pub poll_interval_ms: u64,
    pub probe_timeout_ms: u64,
    pub probe_method: ProbeMethod,
    pub recheck_on_reconnect: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            api_health_path: "/health".into(),
            poll_interval_ms: 30_000,
            probe_timeout_ms: 5_000,
            probe_method: ProbeMethod::Head,
            recheck_on_reconnect: true,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/fleet/connectivity.toml or
/// $HOME/.config/...)
pub fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("fleet/connectivity.toml"))
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Connectivity Monitor Configuration:")?;
        write_title_1(f, "API")?;
        write_1(f, "Base URL", &self.api_base_url)?;
        write_1(f, "Health Path", &self.api_health_path)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Method", &self.probe_method)?;
        write_1(f, "Timeout (ms)", &self.probe_timeout_ms)?;
        write_title_1(f, "Schedule")?;
        write_1(f, "Poll Interval (ms)", &self.poll_interval_ms)?;
        write_1(f, "Recheck On Reconnect", &self.recheck_on_reconnect)?;

        Ok(())
    }
}

impl MonitorConfig {
    /// Load the monitor configuration from a TOML file
    ///
    /// Creates a default config in ~/.config/fleet/connectivity.toml
    /// or the specified path if one does not exist yet.
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::Read { path: config_path.clone(), source })?;
            Self::from_toml_str(&raw_string)
        } else {
            tracing::info!(path = %config_path.display(), "Writing default connectivity config");
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Write { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.health_url()?;

        if self.probe_timeout_ms < MIN_PROBE_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "probeTimeoutMs too small: {} ms (min: {} ms)",
                self.probe_timeout_ms, MIN_PROBE_TIMEOUT_MS
            )));
        }

        if self.probe_timeout_ms > MAX_PROBE_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "probeTimeoutMs too large: {} ms (max: {} ms)",
                self.probe_timeout_ms, MAX_PROBE_TIMEOUT_MS
            )));
        }

        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "pollIntervalMs too small: {} ms (min: {} ms)",
                self.poll_interval_ms, MIN_POLL_INTERVAL_MS
            )));
        }

        Ok(())
    }

    /// Full URL of the reachability endpoint
    pub fn health_url(&self) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_health_path.trim_start_matches('/')
        );
        let url = Url::parse(&joined)
            .map_err(|e| ConfigError::Invalid(format!("apiBaseUrl {:?}: {e}", self.api_base_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!("unsupported URL scheme: {other}"))),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
