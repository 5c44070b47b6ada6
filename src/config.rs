//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a relay listening on UDP 44333 and serving WebSocket clients on 8005.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{RelayError, Result};

/// Environment variable overriding `ingress.port`
pub const ENV_UDP_PORT: &str = "JAMMON_UDP_PORT";

/// Environment variable overriding `egress.port`
pub const ENV_WS_PORT: &str = "JAMMON_WS_PORT";

/// Smallest accepted receive buffer
const MIN_DATAGRAM_SIZE: usize = 64;

/// Largest UDP payload over IPv4
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ingress: IngressConfig,

    #[serde(default)]
    pub egress: EgressConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// UDP telemetry ingress
#[derive(Debug, Deserialize, Clone)]
pub struct IngressConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_udp_port")]
    pub port: u16,

    /// Receive buffer size; longer datagrams are truncated by the OS
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,

    /// Datagrams between status log messages
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

/// WebSocket egress
#[derive(Debug, Deserialize, Clone)]
pub struct EgressConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_ws_port")]
    pub port: u16,

    #[serde(default = "default_ws_path")]
    pub path: String,
}

/// Dashboard session limits
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_max_track_segments")]
    pub max_track_segments: usize,
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_udp_port() -> u16 { 44333 }
fn default_max_datagram_size() -> usize { 4096 }
fn default_stats_interval() -> u64 { 100 }

fn default_ws_port() -> u16 { 8005 }
fn default_ws_path() -> String { "/ws".to_string() }

fn default_max_track_segments() -> usize { 1000 }

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_udp_port(),
            max_datagram_size: default_max_datagram_size(),
            stats_interval: default_stats_interval(),
        }
    }
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_ws_port(),
            path: default_ws_path(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_track_segments: default_max_track_segments(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> RelayError {
    RelayError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use jammon_relay::config::Config;
    ///
    /// let config = Config::load("config/relay.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `JAMMON_UDP_PORT` / `JAMMON_WS_PORT` from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but is not a valid port, or the
    /// resulting configuration fails validation
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_UDP_PORT) {
            self.ingress.port = parse_port(ENV_UDP_PORT, &value)?;
        }

        if let Some(value) = lookup(ENV_WS_PORT) {
            self.egress.port = parse_port(ENV_WS_PORT, &value)?;
        }

        self.validate()
    }

    /// `host:port` the UDP socket binds to
    pub fn ingress_addr(&self) -> String {
        format!("{}:{}", self.ingress.bind_address, self.ingress.port)
    }

    /// `host:port` the WebSocket listener binds to
    pub fn egress_addr(&self) -> String {
        format!("{}:{}", self.egress.bind_address, self.egress.port)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.ingress.bind_address.is_empty() || self.egress.bind_address.is_empty() {
            return Err(invalid("bind_address cannot be empty"));
        }

        if self.ingress.port == 0 || self.egress.port == 0 {
            return Err(invalid("ports must be greater than 0"));
        }

        if self.ingress.bind_address == self.egress.bind_address
            && self.ingress.port == self.egress.port
        {
            return Err(invalid(format!(
                "ingress and egress cannot share port {} on {}",
                self.ingress.port, self.ingress.bind_address
            )));
        }

        if !self.egress.path.starts_with('/') {
            return Err(invalid("egress path must start with '/'"));
        }

        if !(MIN_DATAGRAM_SIZE..=MAX_DATAGRAM_SIZE).contains(&self.ingress.max_datagram_size) {
            return Err(invalid(format!(
                "max_datagram_size must be between {} and {}",
                MIN_DATAGRAM_SIZE, MAX_DATAGRAM_SIZE
            )));
        }

        if self.ingress.stats_interval == 0 {
            return Err(invalid("stats_interval must be greater than 0"));
        }

        if self.session.max_track_segments == 0 {
            return Err(invalid("max_track_segments must be greater than 0"));
        }

        Ok(())
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| invalid(format!("{}={:?} is not a valid port: {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    fn load_str(content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_ok!(config.validate());
        assert_eq!(config.ingress_addr(), "0.0.0.0:44333");
        assert_eq!(config.egress_addr(), "0.0.0.0:8005");
        assert_eq!(config.egress.path, "/ws");
        assert_eq!(config.session.max_track_segments, 1000);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let config = assert_ok!(load_str(""));
        assert_eq!(config.ingress.port, 44333);
        assert_eq!(config.ingress.max_datagram_size, 4096);
        assert_eq!(config.ingress.stats_interval, 100);
        assert_eq!(config.egress.port, 8005);
    }

    #[test]
    fn test_load_config_from_file() {
        let config = assert_ok!(load_str(
            r#"
[ingress]
bind_address = "127.0.0.1"
port = 50000

[egress]
port = 9000
path = "/telemetry"
"#
        ));

        assert_eq!(config.ingress_addr(), "127.0.0.1:50000");
        assert_eq!(config.egress_addr(), "0.0.0.0:9000");
        assert_eq!(config.egress.path, "/telemetry");
        assert_eq!(config.ingress.max_datagram_size, 4096);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = assert_ok!(Config::load(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/config/relay.toml"
        )));
        let defaults = Config::default();

        assert_eq!(config.ingress_addr(), defaults.ingress_addr());
        assert_eq!(config.egress_addr(), defaults.egress_addr());
        assert_eq!(config.egress.path, defaults.egress.path);
        assert_eq!(config.ingress.max_datagram_size, defaults.ingress.max_datagram_size);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/relay.toml");
        assert!(matches!(result, Err(RelayError::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = load_str("[ingress\nport = 1");
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        assert_err!(load_str("[ingress]\nport = 0\n"));
        assert_err!(load_str("[egress]\npath = \"ws\"\n"));
    }

    #[test]
    fn test_port_zero() {
        let mut config = Config::default();
        config.egress.port = 0;
        assert_err!(config.validate());
    }

    #[test]
    fn test_shared_port_same_address() {
        let mut config = Config::default();
        config.egress.port = config.ingress.port;
        assert_err!(config.validate());
    }

    #[test]
    fn test_shared_port_different_address() {
        let mut config = Config::default();
        config.egress.port = config.ingress.port;
        config.egress.bind_address = "127.0.0.1".to_string();
        assert_ok!(config.validate());
    }

    #[test]
    fn test_empty_bind_address() {
        let mut config = Config::default();
        config.ingress.bind_address = String::new();
        assert_err!(config.validate());
    }

    #[test]
    fn test_datagram_size_bounds() {
        let mut config = Config::default();

        config.ingress.max_datagram_size = 63;
        assert_err!(config.validate());

        config.ingress.max_datagram_size = 64;
        assert_ok!(config.validate());

        config.ingress.max_datagram_size = 65_507;
        assert_ok!(config.validate());

        config.ingress.max_datagram_size = 65_508;
        assert_err!(config.validate());
    }

    #[test]
    fn test_stats_interval_zero() {
        let mut config = Config::default();
        config.ingress.stats_interval = 0;
        assert_err!(config.validate());
    }

    #[test]
    fn test_max_track_segments_zero() {
        let mut config = Config::default();
        config.session.max_track_segments = 0;
        assert_err!(config.validate());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        assert_ok!(config.apply_overrides(env(&[(ENV_UDP_PORT, "45000"), (ENV_WS_PORT, " 8080 ")])));
        assert_eq!(config.ingress.port, 45000);
        assert_eq!(config.egress.port, 8080);
    }

    #[test]
    fn test_env_overrides_absent() {
        let mut config = Config::default();
        assert_ok!(config.apply_overrides(env(&[])));
        assert_eq!(config.ingress.port, 44333);
        assert_eq!(config.egress.port, 8005);
    }

    #[test]
    fn test_env_override_not_a_port() {
        let mut config = Config::default();
        assert_err!(config.apply_overrides(env(&[(ENV_UDP_PORT, "70000")])));

        let mut config = Config::default();
        assert_err!(config.apply_overrides(env(&[(ENV_WS_PORT, "http")])));
    }

    #[test]
    fn test_env_override_collision() {
        let mut config = Config::default();
        assert_err!(config.apply_overrides(env(&[(ENV_WS_PORT, "44333")])));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_bind_address(), "0.0.0.0");
        assert_eq!(default_udp_port(), 44333);
        assert_eq!(default_max_datagram_size(), 4096);
        assert_eq!(default_stats_interval(), 100);
        assert_eq!(default_ws_port(), 8005);
        assert_eq!(default_ws_path(), "/ws");
        assert_eq!(default_max_track_segments(), 1000);
    }
}
