use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::env;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Verbosity of a single invocation.
///
/// On the wire this is either the numeric value used by the construct
/// layer (`0` = error ... `3` = debug) or the level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLogLevel {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawLogLevel::deserialize(deserializer)? {
            RawLogLevel::Number(0) => Ok(LogLevel::Error),
            RawLogLevel::Number(1) => Ok(LogLevel::Warn),
            RawLogLevel::Number(2) => Ok(LogLevel::Info),
            RawLogLevel::Number(3) => Ok(LogLevel::Debug),
            RawLogLevel::Number(n) => Err(D::Error::custom(format!("unknown log level {}", n))),
            RawLogLevel::Text(s) => s.parse().map_err(D::Error::custom),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "error" => Ok(LogLevel::Error),
            "1" | "warn" | "warning" => Ok(LogLevel::Warn),
            "2" | "info" => Ok(LogLevel::Info),
            "3" | "debug" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl LogLevel {
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }
}

/// Process-wide settings, read once at cold start.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    /// Points the Athena client somewhere other than the regional endpoint
    /// (LocalStack and friends).
    pub athena_endpoint_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            athena_endpoint_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = match env::var("LOG_LEVEL") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring LOG_LEVEL: {}", e);
                LogLevel::Info
            }),
            Err(_) => LogLevel::Info,
        };

        let athena_endpoint_url = env::var("ATHENA_ENDPOINT_URL")
            .ok()
            .filter(|url| !url.is_empty());

        Self {
            log_level,
            athena_endpoint_url,
        }
    }
}
