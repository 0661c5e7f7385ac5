use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read config file '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse config file '{path}': {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
}

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// ScoreDB configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
  /// Listening address for the request protocol
  #[serde(default = "default_server_addr")]
  pub server_addr: String,

  /// Snapshot the store is loaded from at startup
  #[serde(default = "default_db_file")]
  pub db_file: String,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

fn default_server_addr() -> String {
  "127.0.0.1:8000".to_string()
}

fn default_db_file() -> String {
  "scoredb.db.json".to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self {
      server_addr: default_server_addr(),
      db_file: default_db_file(),
      log: LogConfig::default(),
    }
  }
}

/// Values that take precedence over the file, usually from flags or the
/// environment
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Overrides {
  pub server_addr: Option<String>,
  pub db_file: Option<String>,
  pub log_level: Option<String>,
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> Result<Self, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_string(),
      source,
    })?;

    toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
      path: path.to_string(),
      source,
    })
  }

  /// Load from `path` when given, defaults otherwise, then apply overrides
  pub fn resolve(path: Option<&str>, overrides: Overrides) -> Result<Self, ConfigError> {
    let mut config = match path {
      Some(path) => Self::from_file(path)?,
      None => Self::default(),
    };

    if let Some(addr) = overrides.server_addr {
      config.server_addr = addr;
    }
    if let Some(db_file) = overrides.db_file {
      config.db_file = db_file;
    }
    if let Some(level) = overrides.log_level {
      config.log.level = level;
    }
    Ok(config)
  }
}
