// Configuration types, deserialized from mirror.config.toml.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;

use crate::error::{MirrorError, MirrorResult};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "mirror.config.toml";

/// Top-level config file. Every section is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    #[serde(default)]
    pub ipc: IpcConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IpcConfig {
    /// Endpoint (pipe) name servers listen on and clients connect to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// How long a client waits for a response, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl IpcConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        IpcConfig {
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "mirror".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LogConfig {
    pub fn level_filter(&self) -> MirrorResult<LevelFilter> {
        self.level
            .parse()
            .map_err(|_| MirrorError::Config(format!("unknown log level '{}'", self.level)))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MirrorConfig {
    pub fn from_toml_str(s: &str) -> MirrorResult<Self> {
        let config: MirrorConfig = toml::from_str(s).map_err(|e| MirrorError::Config(e.to_string()))?;
        config.log.level_filter()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> MirrorResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| MirrorError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, else the default file if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> MirrorResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE_NAME).is_file() => Self::load(CONFIG_FILE_NAME),
            None => Ok(Self::default()),
        }
    }
}
