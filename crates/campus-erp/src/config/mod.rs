use chrono::NaiveDate;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub enrollment: EnrollmentConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let erp_path = env::var("APP_ERP_DATABASE").unwrap_or_else(|_| "erp.db".to_string());
        let auth_path = env::var("APP_AUTH_DATABASE").unwrap_or_else(|_| "auth.db".to_string());

        let drop_cutoff = match env::var("APP_DROP_CUTOFF") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidDropCutoff { value: raw })?,
            Err(_) => EnrollmentConfig::default().drop_cutoff,
        };

        let course_drop_mode = match env::var("APP_COURSE_DROP_MODE") {
            Ok(raw) => CourseDropMode::parse(&raw)
                .ok_or(ConfigError::InvalidCourseDropMode { value: raw })?,
            Err(_) => CourseDropMode::default(),
        };

        let bcrypt_cost = match env::var("APP_BCRYPT_COST") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|cost| SecurityConfig::COST_RANGE.contains(cost))
                .ok_or(ConfigError::InvalidBcryptCost { value: raw })?,
            Err(_) => SecurityConfig::default().bcrypt_cost,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database: DatabaseConfig {
                erp_path: PathBuf::from(erp_path),
                auth_path: PathBuf::from(auth_path),
            },
            enrollment: EnrollmentConfig {
                drop_cutoff,
                course_drop_mode,
            },
            security: SecurityConfig { bcrypt_cost },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the two SQLite databases. `:memory:` is accepted for either path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub erp_path: PathBuf,
    pub auth_path: PathBuf,
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            erp_path: PathBuf::from(":memory:"),
            auth_path: PathBuf::from(":memory:"),
        }
    }
}

/// How a course-level drop removes the student's enrollment rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseDropMode {
    /// Delete the REGISTERED rows outright.
    #[default]
    Delete,
    /// Flip the rows to DROPPED, keeping the history.
    Status,
}

impl CourseDropMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "delete" | "hard" => Some(Self::Delete),
            "status" | "soft" => Some(Self::Status),
            _ => None,
        }
    }
}

/// Registration policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentConfig {
    /// Per-enrollment drops are accepted strictly before this date.
    pub drop_cutoff: NaiveDate,
    pub course_drop_mode: CourseDropMode,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            drop_cutoff: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap_or(NaiveDate::MAX),
            course_drop_mode: CourseDropMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
}

impl SecurityConfig {
    pub const COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 12 }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDropCutoff { value: String },
    InvalidCourseDropMode { value: String },
    InvalidBcryptCost { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDropCutoff { value } => {
                write!(f, "APP_DROP_CUTOFF '{value}' must be a YYYY-MM-DD date")
            }
            ConfigError::InvalidCourseDropMode { value } => {
                write!(f, "APP_COURSE_DROP_MODE '{value}' must be 'delete' or 'status'")
            }
            ConfigError::InvalidBcryptCost { value } => {
                write!(f, "APP_BCRYPT_COST '{value}' must be an integer between 4 and 31")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDropCutoff { .. }
            | ConfigError::InvalidCourseDropMode { .. }
            | ConfigError::InvalidBcryptCost { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_ERP_DATABASE",
            "APP_AUTH_DATABASE",
            "APP_DROP_CUTOFF",
            "APP_COURSE_DROP_MODE",
            "APP_BCRYPT_COST",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.database.erp_path, PathBuf::from("erp.db"));
        assert_eq!(config.database.auth_path, PathBuf::from("auth.db"));
        assert_eq!(
            config.enrollment.drop_cutoff,
            NaiveDate::from_ymd_opt(2025, 11, 30).expect("valid")
        );
        assert_eq!(config.enrollment.course_drop_mode, CourseDropMode::Delete);
        assert_eq!(config.security.bcrypt_cost, 12);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_enrollment_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DROP_CUTOFF", "2026-04-15");
        env::set_var("APP_COURSE_DROP_MODE", "status");
        env::set_var("APP_BCRYPT_COST", "10");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.enrollment.drop_cutoff,
            NaiveDate::from_ymd_opt(2026, 4, 15).expect("valid")
        );
        assert_eq!(config.enrollment.course_drop_mode, CourseDropMode::Status);
        assert_eq!(config.security.bcrypt_cost, 10);
        reset_env();
    }

    #[test]
    fn rejects_malformed_cutoff_and_cost() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DROP_CUTOFF", "30/11/2025");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidDropCutoff { .. })
        ));

        reset_env();
        env::set_var("APP_BCRYPT_COST", "99");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidBcryptCost { .. })
        ));
        reset_env();
    }
}
