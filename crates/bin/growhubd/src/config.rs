//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `growhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Rule engine settings.
    pub engine: EngineConfig,
    /// Virtual grow tent used when no hardware is attached.
    #[serde(rename = "virtual")]
    pub virtual_tent: VirtualConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    pub max_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Rule engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds between two scheduled ticks.
    pub tick_secs: u64,
    /// How long a device command may wait for its acknowledgement.
    pub dispatch_timeout_ms: u64,
    /// Local offset used for time conditions and schedules, e.g. `+02:00`.
    pub utc_offset: String,
}

/// Initial state of the virtual grow tent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Sensor readings available from startup.
    pub readings: BTreeMap<String, f64>,
    /// Known actuators. Empty accepts any device name.
    pub devices: Vec<String>,
}

impl Config {
    /// Load configuration from `growhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("growhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("GROWHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("GROWHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("GROWHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("GROWHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(secs) = var("GROWHUB_TICK_SECS").and_then(|val| val.parse().ok()) {
            self.engine.tick_secs = secs;
        }
        if let Some(val) = var("GROWHUB_UTC_OFFSET") {
            self.engine.utc_offset = val;
        }
        if let Some(val) = var("GROWHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        // Schedules match on the wall-clock minute, so every minute needs a tick.
        if !(1..=60).contains(&self.engine.tick_secs) {
            return Err(ConfigError::Validation(format!(
                "tick_secs must be between 1 and 60, got {}",
                self.engine.tick_secs
            )));
        }
        if self.engine.dispatch_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dispatch_timeout_ms must be non-zero".to_string(),
            ));
        }
        if let Some((sensor, value)) = self
            .virtual_tent
            .readings
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ConfigError::Validation(format!(
                "reading for sensor {sensor:?} is not finite ({value})"
            )));
        }
        self.utc_offset()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.engine.tick_secs)
    }

    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.dispatch_timeout_ms)
    }

    /// Parse the configured local offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] unless the offset reads `Z` or
    /// `±HH:MM` within a day.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_offset(&self.engine.utc_offset).ok_or_else(|| {
            ConfigError::Validation(format!(
                "invalid utc_offset {:?}, expected +HH:MM",
                self.engine.utc_offset
            ))
        })
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:growhub.db?mode=rwc".to_string(),
            max_connections: 4,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "growhubd=info,growhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_secs: 30,
            dispatch_timeout_ms: 5000,
            utc_offset: "+00:00".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
