//! Application configuration management.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Recurring expense scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Attachment storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a single request, including its database transaction.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a connection before failing.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

/// Recurring expense scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the daily sweep runs at all.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    /// Local wall-clock time of the daily sweep, `HH:MM`.
    #[serde(default = "default_run_at")]
    pub run_at: String,
    /// IANA timezone that defines the calendar day (e.g. `Asia/Jakarta`).
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            run_at: default_run_at(),
            timezone: default_timezone(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_run_at() -> String {
    "00:00".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl SchedulerConfig {
    /// Parses `run_at` as a wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns an error message if the value is not `HH:MM`.
    pub fn run_at_time(&self) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(&self.run_at, "%H:%M")
            .map_err(|e| format!("invalid scheduler.run_at '{}': {e}", self.run_at))
    }

    /// Parses `timezone` as an IANA timezone.
    ///
    /// # Errors
    ///
    /// Returns an error message if the timezone is unknown.
    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("invalid scheduler.timezone '{}': {e}", self.timezone))
    }
}

/// Attachment storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// `local` or `s3`.
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    /// Root directory for the local provider.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// S3 endpoint URL.
    pub endpoint: Option<String>,
    /// S3 bucket name.
    pub bucket: Option<String>,
    /// S3 access key ID.
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    pub secret_access_key: Option<String>,
    /// S3 region.
    pub region: Option<String>,
    /// Maximum receipt size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            root: default_storage_root(),
            endpoint: None,
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            region: None,
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_storage_provider() -> String {
    "local".to_string()
}

fn default_storage_root() -> String {
    "uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CRMDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("CRMDESK__DATABASE__URL", Some("postgres://localhost/crmdesk_test")),
                ("CRMDESK__SERVER__PORT", Some("9090")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/crmdesk_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert!(config.scheduler.enabled);
                assert_eq!(config.storage.provider, "local");
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars_unset(["CRMDESK__DATABASE__URL"], || {
            assert!(AppConfig::load().is_err());
        });
    }

    #[test]
    fn test_scheduler_parsing() {
        let scheduler = SchedulerConfig {
            enabled: true,
            run_at: "01:30".to_string(),
            timezone: "Asia/Jakarta".to_string(),
        };
        assert_eq!(
            scheduler.run_at_time().unwrap(),
            NaiveTime::from_hms_opt(1, 30, 0).unwrap()
        );
        assert_eq!(scheduler.tz().unwrap(), chrono_tz::Asia::Jakarta);
    }

    #[test]
    fn test_scheduler_rejects_garbage() {
        let scheduler = SchedulerConfig {
            enabled: true,
            run_at: "midnight".to_string(),
            timezone: "Mars/Olympus".to_string(),
        };
        assert!(scheduler.run_at_time().is_err());
        assert!(scheduler.tz().is_err());
    }
}
