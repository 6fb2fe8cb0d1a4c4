use anyhow::{bail, Context, Result};
use chrono::Duration;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file name, resolved inside `server.data_dir`
    #[serde(default = "default_db_filename")]
    pub filename: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            filename: default_db_filename(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_filename() -> String {
    "timetable.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to verify session tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Cookie consulted when no Authorization header is present
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_jwt_secret() -> String {
    // Unconfigured servers get a throwaway secret, so no externally issued token verifies
    uuid::Uuid::new_v4().to_string()
}

fn default_cookie_name() -> String {
    "token".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Length of every class session in minutes
    #[serde(default = "default_session_minutes")]
    pub session_minutes: i64,
    /// IANA zone for form-style time literals and calendar-day grouping
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Replace a session's group links when it is updated
    #[serde(default = "default_reassign_groups")]
    pub reassign_groups_on_update: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            session_minutes: default_session_minutes(),
            timezone: default_timezone(),
            reassign_groups_on_update: default_reassign_groups(),
        }
    }
}

fn default_session_minutes() -> i64 {
    90
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_reassign_groups() -> bool {
    true
}

/// Resolved booking section, ready for the scheduling core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub duration: Duration,
    pub timezone: Tz,
    pub reassign_groups_on_update: bool,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            duration: Duration::minutes(default_session_minutes()),
            timezone: Tz::UTC,
            reassign_groups_on_update: default_reassign_groups(),
        }
    }
}

impl BookingConfig {
    pub fn policy(&self) -> Result<BookingPolicy> {
        if self.session_minutes <= 0 {
            bail!(
                "booking.session_minutes must be positive, got {}",
                self.session_minutes
            );
        }
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid booking.timezone '{}': {}", self.timezone, e))?;

        Ok(BookingPolicy {
            duration: Duration::minutes(self.session_minutes),
            timezone,
            reassign_groups_on_update: self.reassign_groups_on_update,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        // Surface a bad booking section at startup rather than on the first request
        config.booking.policy()?;
        Ok(config)
    }

    pub fn booking_policy(&self) -> Result<BookingPolicy> {
        self.booking.policy()
    }

    pub fn database_path(&self) -> PathBuf {
        self.server.data_dir.join(&self.database.filename)
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            booking: BookingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.filename, "timetable.db");
        assert_eq!(config.auth.cookie_name, "token");

        let policy = config.booking_policy().unwrap();
        assert_eq!(policy.duration, Duration::minutes(90));
        assert_eq!(policy.timezone, Tz::UTC);
        assert!(policy.reassign_groups_on_update);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [booking]
            timezone = "Europe/Moscow"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        let policy = config.booking_policy().unwrap();
        assert_eq!(policy.timezone, chrono_tz::Europe::Moscow);
        assert_eq!(policy.duration, Duration::minutes(90));
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let result = Config::from_toml(
            r#"
            [booking]
            timezone = "Mars/Olympus_Mons"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let result = Config::from_toml(
            r#"
            [booking]
            session_minutes = 0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_database_path_inside_data_dir() {
        let config = Config::default();
        assert_eq!(config.database_path(), PathBuf::from("./data/timetable.db"));
    }
}
