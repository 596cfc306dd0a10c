//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Configuration is loaded once and passed by reference into the client
//! modules; nothing reads ambient state after startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Scan-log poll interval bounds (seconds).
pub const SCAN_POLL_MIN_SECS: u64 = 3;
pub const SCAN_POLL_MAX_SECS: u64 = 60;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token attached to every authenticated call.
    #[serde(default)]
    pub auth_token: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_request_timeout() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: String::new(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Biometric middleware coordinates, forwarded verbatim in the body of
/// every device-proxy call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub middleware_ip: String,

    #[serde(default)]
    pub device_key: String,

    #[serde(default)]
    pub secret: String,
}

impl DeviceConfig {
    /// Whether all three coordinates are present.
    pub fn is_complete(&self) -> bool {
        !self.middleware_ip.trim().is_empty()
            && !self.device_key.trim().is_empty()
            && !self.secret.trim().is_empty()
    }
}

/// Polling intervals
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Attendance status refresh interval (seconds).
    #[serde(default = "default_attendance_interval")]
    pub attendance_interval_secs: u64,

    /// Scan-log refresh interval (seconds), clamped to 3-60.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

fn default_attendance_interval() -> u64 {
    30
}

fn default_scan_interval() -> u64 {
    5
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            attendance_interval_secs: default_attendance_interval(),
            scan_interval_secs: default_scan_interval(),
        }
    }
}

impl PollingConfig {
    /// Scan interval with the 3-60 s bounds applied.
    pub fn clamped_scan_interval_secs(&self) -> u64 {
        self.scan_interval_secs
            .clamp(SCAN_POLL_MIN_SECS, SCAN_POLL_MAX_SECS)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("rollcall").join("config.toml")),
            Some(PathBuf::from("/etc/rollcall/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ROLLCALL_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(token) = std::env::var("ROLLCALL_AUTH_TOKEN") {
            self.api.auth_token = token;
        }

        if let Ok(ip) = std::env::var("ROLLCALL_MIDDLEWARE_IP") {
            self.device.middleware_ip = ip;
        }
        if let Ok(key) = std::env::var("ROLLCALL_DEVICE_KEY") {
            self.device.device_key = key;
        }
        if let Ok(secret) = std::env::var("ROLLCALL_DEVICE_SECRET") {
            self.device.secret = secret;
        }

        if let Ok(secs) = std::env::var("ROLLCALL_SCAN_INTERVAL") {
            if let Ok(s) = secs.parse() {
                self.polling.scan_interval_secs = s;
            }
        }

        if let Ok(level) = std::env::var("ROLLCALL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ROLLCALL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            device: DeviceConfig::default(),
            polling: PollingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Rollcall Configuration
#
# Environment variables override these settings:
# - ROLLCALL_API_URL
# - ROLLCALL_AUTH_TOKEN
# - ROLLCALL_MIDDLEWARE_IP
# - ROLLCALL_DEVICE_KEY
# - ROLLCALL_DEVICE_SECRET
# - ROLLCALL_SCAN_INTERVAL
# - ROLLCALL_LOG_LEVEL
# - ROLLCALL_LOG_FORMAT

[api]
# Attendance backend base URL
base_url = "http://localhost:4000"

# Bearer token for authenticated calls
auth_token = ""

# Request timeout in milliseconds
request_timeout_ms = 15000

# Retry attempts for mutations
max_retries = 3

[device]
# Biometric middleware coordinates, sent with every device-proxy call
middleware_ip = ""
device_key = ""
secret = ""

[polling]
# Attendance status refresh interval (seconds)
attendance_interval_secs = 30

# Scan-log refresh interval (seconds, clamped to 3-60)
scan_interval_secs = 5

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(config.polling.attendance_interval_secs, 30);
        assert_eq!(config.polling.scan_interval_secs, 5);
        assert!(!config.device.is_complete());
    }

    #[test]
    fn test_scan_interval_clamped() {
        let mut polling = PollingConfig::default();
        polling.scan_interval_secs = 1;
        assert_eq!(polling.clamped_scan_interval_secs(), 3);
        polling.scan_interval_secs = 300;
        assert_eq!(polling.clamped_scan_interval_secs(), 60);
        polling.scan_interval_secs = 10;
        assert_eq!(polling.clamped_scan_interval_secs(), 10);
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:4000");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[api]
base_url = "http://backend:4000"
auth_token = "tok"

[device]
middleware_ip = "10.0.0.5"
device_key = "k"
secret = "s"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://backend:4000");
        assert!(config.device.is_complete());
    }
}
