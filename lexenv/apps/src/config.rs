use anyhow::Context;
use lexenv_middleware::{LogConfig, LogLevel};
use lexenv_repl::ReplConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `lexenv` binary, read from a YAML file.
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LexEnvConfig {
    pub log: LogConfig,
    pub repl: ReplConfig,
}

impl LexEnvConfig {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("invalid configuration")
    }

    /// Reads the file at `path`, or returns the default configuration.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("could not read {}", path.display()))?;
                Self::from_yaml(&content).with_context(|| format!("in {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Command line flags take precedence over the file.
    pub fn with_overrides(
        mut self,
        debug: bool,
        log_dir: Option<PathBuf>,
        history: Option<PathBuf>,
    ) -> Self {
        if debug {
            self.log.level = LogLevel::Trace;
        }
        if log_dir.is_some() {
            self.log.dir = log_dir;
        }
        if history.is_some() {
            self.repl.history = history;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml() {
        let config = LexEnvConfig::from_yaml(
            "log:\n  level: warn\n  dir: logs\nrepl:\n  echo: false\n",
        )
        .unwrap();
        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.log.dir, Some(PathBuf::from("logs")));
        assert!(!config.repl.echo);
        assert_eq!(config.repl.history, None);

        assert!(LexEnvConfig::from_yaml("log:\n  level: loud\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = LexEnvConfig::default().with_overrides(
            true,
            None,
            Some(PathBuf::from("history.txt")),
        );
        assert_eq!(config.log.level, LogLevel::Trace);
        assert_eq!(config.log.dir, None);
        assert_eq!(config.repl.history, Some(PathBuf::from("history.txt")));
        assert_eq!(LexEnvConfig::load(None).unwrap(), LexEnvConfig::default());
    }
}
