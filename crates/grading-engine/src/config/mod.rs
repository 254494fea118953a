use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::grading::{DisplayScale, LeafValuePolicy};

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
    pub grading: GradingConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            grading: GradingConfig::from_env()?,
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

pub const DEFAULT_NAME_MAX_LENGTH: usize = 100;

/// Dials for authoring validation and rating evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingConfig {
    pub display_scale: DisplayScale,
    pub max_name_length: usize,
    /// Applied to default values supplied while authoring a method.
    pub authoring_value_policy: LeafValuePolicy,
    /// Applied to leaf values submitted by a rater.
    pub submission_value_policy: LeafValuePolicy,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            display_scale: DisplayScale::default(),
            max_name_length: DEFAULT_NAME_MAX_LENGTH,
            authoring_value_policy: LeafValuePolicy::Reject,
            submission_value_policy: LeafValuePolicy::Reject,
        }
    }
}

impl GradingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let display_min = parse_f64_var("GRADING_DISPLAY_MIN", defaults.display_scale.min())?;
        let display_max = parse_f64_var("GRADING_DISPLAY_MAX", defaults.display_scale.max())?;
        let display_scale = DisplayScale::new(display_min, display_max).ok_or(
            ConfigError::InvalidDisplayScale {
                min: display_min,
                max: display_max,
            },
        )?;

        let max_name_length = match env::var("GRADING_NAME_MAX_LENGTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|length| *length > 0)
                .ok_or(ConfigError::InvalidNameLength(raw))?,
            Err(_) => defaults.max_name_length,
        };

        let authoring_value_policy = parse_policy_var(
            "GRADING_AUTHORING_VALUE_POLICY",
            defaults.authoring_value_policy,
        )?;
        let submission_value_policy = parse_policy_var(
            "GRADING_SUBMISSION_VALUE_POLICY",
            defaults.submission_value_policy,
        )?;

        Ok(Self {
            display_scale,
            max_name_length,
            authoring_value_policy,
            submission_value_policy,
        })
    }
}

fn parse_f64_var(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_policy_var(
    name: &'static str,
    default: LeafValuePolicy,
) -> Result<LeafValuePolicy, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<LeafValuePolicy>()
            .map_err(|_| ConfigError::InvalidPolicy { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidDisplayScale { min: f64, max: f64 },
    InvalidNameLength(String),
    InvalidPolicy { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be a valid IP address or 'localhost'")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a finite number (found '{value}')")
            }
            ConfigError::InvalidDisplayScale { min, max } => write!(
                f,
                "display scale minimum {min} must be below maximum {max}"
            ),
            ConfigError::InvalidNameLength(value) => write!(
                f,
                "GRADING_NAME_MAX_LENGTH must be a positive integer (found '{value}')"
            ),
            ConfigError::InvalidPolicy { name, value } => {
                write!(f, "{name} must be 'reject' or 'clamp' (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_is_lenient() {
        assert_eq!(AppEnvironment::from_str(" PROD "), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from_str("ci"), AppEnvironment::Test);
        assert_eq!(AppEnvironment::from_str("staging"), AppEnvironment::Development);
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let server = ServerConfig {
            host: "LocalHost".to_string(),
            port: 8080,
        };
        let addr = server.socket_addr().expect("localhost resolves");
        assert_eq!(addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn invalid_host_is_reported() {
        let server = ServerConfig {
            host: "not-an-ip".to_string(),
            port: 8080,
        };
        assert!(matches!(
            server.socket_addr(),
            Err(ConfigError::InvalidHost { .. })
        ));
    }

    #[test]
    fn grading_defaults_reject_out_of_range_values() {
        let config = GradingConfig::default();
        assert_eq!(config.authoring_value_policy, LeafValuePolicy::Reject);
        assert_eq!(config.submission_value_policy, LeafValuePolicy::Reject);
        assert_eq!(config.display_scale, DisplayScale::default());
        assert_eq!(config.max_name_length, DEFAULT_NAME_MAX_LENGTH);
    }
}
