use chrono_tz::Tz;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
    pub attendance: AttendanceConfig,
    pub cron: CronConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    pub read_limit: u32,
    pub write_limit: u32,
    /// Lecturer logins per client address.
    pub credential_limit: u32,
    /// Attendance submissions per client address.
    pub attendance_limit: u32,
    /// Failed fingerprint checks per matric number, from any address.
    pub per_student_limit: u32,
    pub window_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub require_client_ip: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Lifetime of a lecturer login, in seconds.
    pub ttl_seconds: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AttendanceConfig {
    /// Externally reachable origin, used to build the URL encoded in QR codes.
    pub public_url: String,
    /// IANA timezone name used when rendering timestamps.
    pub timezone: String,
    pub default_session_minutes: i64,
    pub max_session_minutes: i64,
    /// Interval of the background expiry sweep. Zero disables the sweeper.
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CronConfig {
    /// Shared secret expected in `X-Cron-Token`; empty disables the HTTP trigger.
    pub auth_token: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://attendance.db?mode=rwc".to_string(),
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            read_limit: 300,
            write_limit: 60,
            credential_limit: 20,
            attendance_limit: 600,
            per_student_limit: 5,
            window_seconds: 60,
            cleanup_interval_seconds: 300,
            require_client_ip: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60 * 60 * 12,
            cookie_secure: false,
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            public_url: "http://127.0.0.1:8000".to_string(),
            timezone: "UTC".to_string(),
            default_session_minutes: 60,
            max_session_minutes: 240,
            sweep_interval_seconds: 60,
        }
    }
}

impl AttendanceConfig {
    /// Falls back to UTC for names `chrono_tz` does not know; `Config::load` rejects those up front.
    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or(Tz::UTC)
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Attendance.toml (base configuration file)
    /// 3. Environment variables prefixed with ATTENDANCE_, `__` separating sections
    ///    (e.g. ATTENDANCE_DATABASE__MAX_CONNECTIONS)
    /// 4. DATABASE_URL environment variable
    pub fn load() -> Result<Self, figment::Error> {
        let defaults = toml::to_string(&Config::default()).map_err(|e| figment::Error::from(e.to_string()))?;

        let config: Config = Figment::new()
            .merge(Toml::string(&defaults).nested())
            .merge(Toml::file("Attendance.toml").nested())
            .merge(Env::prefixed("ATTENDANCE_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .extract()?;

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), figment::Error> {
        if self.attendance.timezone.parse::<Tz>().is_err() {
            return Err(figment::Error::from(format!("Unknown timezone '{}'", self.attendance.timezone)));
        }
        if self.attendance.default_session_minutes < 1 || self.attendance.default_session_minutes > self.attendance.max_session_minutes {
            return Err(figment::Error::from(
                "attendance.default_session_minutes must be between 1 and attendance.max_session_minutes".to_string(),
            ));
        }
        if self.session.ttl_seconds < 60 {
            return Err(figment::Error::from("session.ttl_seconds must be at least 60".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_checks() {
        assert!(Config::default().check().is_ok());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut config = Config::default();
        config.attendance.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.check().is_err());
    }

    #[test]
    fn default_duration_above_max_is_rejected() {
        let mut config = Config::default();
        config.attendance.default_session_minutes = 500;
        assert!(config.check().is_err());
    }

    #[test]
    fn tz_parses_configured_zone() {
        let mut config = AttendanceConfig::default();
        config.timezone = "Africa/Lagos".to_string();
        assert_eq!(config.tz(), chrono_tz::Africa::Lagos);
    }
}
