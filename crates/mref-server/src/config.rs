// ============================================
// File: crates/mref-server/src/config.rs
// ============================================
//! # Server Configuration
//!
//! ## Creation Reason
//! All tunables in one TOML file: where to listen, what the reflector
//! is called, which modules exist, and every timing knob of the
//! keepalive and stream machinery.
//!
//! ## Configuration Example
//! ```toml
//! [network]
//! listen_addr = "[::]:17000"
//!
//! [reflector]
//! callsign = "MREF17"
//! modules = "ABCD"
//!
//! [timing]
//! tick_ms = 20
//! keepalive_period_secs = 3
//! keepalive_timeout_secs = 30
//! stream_timeout_ms = 1600
//!
//! [gatekeeper]
//! blocked_prefixes = []
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! `validate()` must stay cheap and side-effect free: the `validate`
//! CLI subcommand runs it against a candidate file without starting
//! anything.
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use mref_common::{Callsign, Module};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

// ============================================
// Sections
// ============================================

/// Network listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address and port of the UDP listener.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

/// Reflector identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectorConfig {
    /// The reflector designator stamped on relayed frames.
    #[serde(default = "default_callsign")]
    pub callsign: String,

    /// Module letters this reflector serves, e.g. `"ABCD"`.
    #[serde(default = "default_modules")]
    pub modules: String,
}

/// Timing knobs. All periods are measured by the protocol task itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Receive deadline per loop iteration, the task's tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// How often keepalive pings go out.
    #[serde(default = "default_keepalive_period_secs")]
    pub keepalive_period_secs: u64,

    /// How long a silent client survives before eviction.
    #[serde(default = "default_keepalive_timeout_secs")]
    pub keepalive_timeout_secs: u64,

    /// How long a stream may idle before it is dropped.
    #[serde(default = "default_stream_timeout_ms")]
    pub stream_timeout_ms: u64,
}

/// Link authorization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Callsign prefixes refused at link and transmit time.
    #[serde(default)]
    pub blocked_prefixes: Vec<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ============================================
// Defaults
// ============================================

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 17000))
}

fn default_callsign() -> String {
    "MREF".to_string()
}

fn default_modules() -> String {
    "A".to_string()
}

fn default_tick_ms() -> u64 {
    20
}

fn default_keepalive_period_secs() -> u64 {
    3
}

fn default_keepalive_timeout_secs() -> u64 {
    30
}

fn default_stream_timeout_ms() -> u64 {
    1600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            callsign: default_callsign(),
            modules: default_modules(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            keepalive_period_secs: default_keepalive_period_secs(),
            keepalive_timeout_secs: default_keepalive_timeout_secs(),
            stream_timeout_ms: default_stream_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Config
// ============================================

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network listener settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Reflector identity.
    #[serde(default)]
    pub reflector: ReflectorConfig,
    /// Timing knobs.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Link authorization.
    #[serde(default)]
    pub gatekeeper: GatekeeperConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    /// Returns `ServerError::Io` if the file cannot be read,
    /// `ServerError::Config` if it fails to parse or validate.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let text = tokio::fs::read_to_string(path).await?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ServerError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    /// Returns `ServerError::Config` naming the first violation found.
    pub fn validate(&self) -> Result<(), ServerError> {
        Callsign::new(&self.reflector.callsign)
            .map_err(|e| ServerError::config(format!("reflector callsign: {e}")))?;

        if self.reflector.modules.is_empty() {
            return Err(ServerError::config("modules must not be empty"));
        }
        for c in self.reflector.modules.chars() {
            if Module::from_char(c).is_none() {
                return Err(ServerError::config(format!(
                    "module {c:?} is not a letter"
                )));
            }
        }

        if self.timing.tick_ms == 0 {
            return Err(ServerError::config("tick_ms must be positive"));
        }
        if self.timing.keepalive_period_secs == 0 {
            return Err(ServerError::config("keepalive_period_secs must be positive"));
        }
        if self.timing.keepalive_timeout_secs <= self.timing.keepalive_period_secs {
            return Err(ServerError::config(
                "keepalive_timeout_secs must exceed keepalive_period_secs",
            ));
        }
        if self.timing.stream_timeout_ms == 0 {
            return Err(ServerError::config("stream_timeout_ms must be positive"));
        }

        Ok(())
    }

    /// The reflector callsign, parsed.
    ///
    /// # Errors
    /// Returns the validation error for an unparseable callsign.
    pub fn callsign(&self) -> Result<Callsign, ServerError> {
        Ok(Callsign::new(&self.reflector.callsign)?)
    }

    /// The configured module letters, uppercased and deduplicated in
    /// order of first appearance.
    #[must_use]
    pub fn modules(&self) -> Vec<Module> {
        let mut seen = Vec::new();
        for c in self.reflector.modules.chars() {
            if let Some(m) = Module::from_char(c) {
                if !seen.contains(&m) {
                    seen.push(m);
                }
            }
        }
        seen
    }

    /// The receive deadline per task iteration.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.timing.tick_ms)
    }

    /// How often keepalive pings go out.
    #[must_use]
    pub const fn keepalive_period(&self) -> Duration {
        Duration::from_secs(self.timing.keepalive_period_secs)
    }

    /// The eviction threshold for silent clients.
    #[must_use]
    pub const fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.keepalive_timeout_secs)
    }

    /// The idle threshold for open streams.
    #[must_use]
    pub const fn stream_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.stream_timeout_ms)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.network.listen_addr.port(), 17000);
        assert_eq!(config.tick(), Duration::from_millis(20));
        assert_eq!(config.keepalive_period(), Duration::from_secs(3));
        assert_eq!(config.keepalive_timeout(), Duration::from_secs(30));
        assert_eq!(config.stream_timeout(), Duration::from_millis(1600));
    }

    #[test]
    fn test_parse_full_file() {
        let text = r#"
            [network]
            listen_addr = "0.0.0.0:17017"

            [reflector]
            callsign = "MREF17"
            modules = "abcA"

            [timing]
            tick_ms = 10
            keepalive_period_secs = 5
            keepalive_timeout_secs = 60
            stream_timeout_ms = 2000

            [gatekeeper]
            blocked_prefixes = ["N0CALL"]
        "#;
        let config: Config = toml::from_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.network.listen_addr.port(), 17017);
        // uppercased, deduplicated, order preserved
        let letters: String = config.modules().iter().map(Module::as_char).collect();
        assert_eq!(letters, "ABC");
        assert_eq!(config.gatekeeper.blocked_prefixes, vec!["N0CALL"]);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.reflector.modules = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reflector.modules = "A1".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reflector.callsign = "BAD CALL!".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.keepalive_timeout_secs = config.timing.keepalive_period_secs;
        assert!(config.validate().is_err());
    }
}
