use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: parse_log_format(env::var("LOG_FORMAT").ok().as_deref())?,
            event_buffer_size: parse_event_buffer_size(
                env::var("EVENT_BUFFER_SIZE").ok().as_deref(),
            )?,
        })
    }
}

fn parse_log_format(raw: Option<&str>) -> Result<LogFormat, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(LogFormat::Compact),
        Some(value) if value.eq_ignore_ascii_case("compact") => Ok(LogFormat::Compact),
        Some(value) if value.eq_ignore_ascii_case("json") => Ok(LogFormat::Json),
        Some(other) => Err(AppError::Internal(format!(
            "invalid LOG_FORMAT: {other}, expected compact or json"
        ))),
    }
}

fn parse_event_buffer_size(raw: Option<&str>) -> Result<usize, AppError> {
    let size = match raw {
        None => 1024,
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|err| AppError::Internal(format!("invalid EVENT_BUFFER_SIZE: {err}")))?,
    };

    if size == 0 {
        return Err(AppError::Internal(
            "invalid EVENT_BUFFER_SIZE: must be > 0".to_string(),
        ));
    }
    Ok(size)
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
