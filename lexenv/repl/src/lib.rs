//! Console driving the environment tree through nested scopes.
use serde::Deserialize;
use std::path::PathBuf;

pub mod command;
pub mod repl;

/// Console section of the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// File loading and saving the line history.
    pub history: Option<PathBuf>,
    /// Prints the outputs on stdout in addition to the transcript.
    pub echo: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history: None,
            echo: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_config() {
        let config: ReplConfig = serde_yaml::from_str("history: history.txt").unwrap();
        assert_eq!(config.history, Some(PathBuf::from("history.txt")));
        assert!(config.echo);
    }
}
