use crate::logger::{FileDescriptor, Logger, LoggerHandle};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use log::Level;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub mod logger;

pub const LOG_FILE_PREFIX: &str = "lexenv_log";

lazy_static! {
    /// Date of the first logger installation, used to name log files.
    static ref START_DATE: DateTime<Local> = Local::now();
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 1,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Level::from(*self))
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(anyhow::anyhow!("unknown log level: {}", s)),
        }
    }
}

/// Logging section of the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Directory receiving a timestamped log file. Logs go to stderr if unset.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            dir: None,
        }
    }
}

/// Installs the global logger described by `config`.
/// Must be called once, from inside a tokio runtime.
pub fn init(config: &LogConfig) -> anyhow::Result<LoggerHandle> {
    let descriptor = match &config.dir {
        Some(dir) => FileDescriptor::Directory(dir.clone()),
        None => FileDescriptor::Stderr,
    };
    let (logger, handle) = Logger::new(config.level.into(), descriptor, *START_DATE)?;
    let filter = logger.max_level_filter();
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("could not install logger: {}", e))?;
    log::set_max_level(filter);
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert!(LogLevel::from_str("verbose").is_err());
        assert_eq!(Level::from(LogLevel::Warn), Level::Warn);
        assert_eq!(LogLevel::Trace.to_string(), "TRACE");
    }

    #[test]
    fn test_log_config() {
        let config: LogConfig = serde_yaml::from_str("level: debug\ndir: /tmp/lexenv").unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.dir, Some(PathBuf::from("/tmp/lexenv")));
        let config: LogConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, LogConfig::default());
    }
}
