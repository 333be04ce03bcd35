use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::system::rate::NegativeDeltaPolicy;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sampling: SamplingConfig,
    pub kill: KillConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub cpu_window_ms: u64,
    pub negative_delta: NegativeDeltaPolicy,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            cpu_window_ms: 500,
            negative_delta: NegativeDeltaPolicy::PassThrough,
        }
    }
}

impl SamplingConfig {
    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_window_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KillConfig {
    pub timeout_ms: u64,
    /// Native termination argv; `{pid}` is substituted. Platform default when unset.
    pub command: Option<Vec<String>>,
    pub library_fallback: bool,
}

impl Default for KillConfig {
    fn default() -> Self {
        KillConfig {
            timeout_ms: 5000,
            command: None,
            library_fallback: false,
        }
    }
}

impl KillConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hostwatch").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
