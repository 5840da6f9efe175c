use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{InjectorError, Result};
use crate::injector::PayloadFormat;

pub const CONFIG_PATH: &str = "./fault_injector.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub publisher: PublisherConfig,
    pub fault: FaultConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PublisherConfig {
    pub topic: String,
    pub format: PayloadFormat,
    /// Overrides the format's own cadence when set.
    pub interval_ms: Option<u64>,
}

/// Fault draw parameters: a roll in `[0, draw_max]` below `threshold`
/// picks a code in `[0, max_code]`, anything else publishes 0.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FaultConfig {
    pub draw_max: u32,
    pub threshold: u32,
    pub max_code: u8,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "mqtt.eclipseprojects.io".to_string(),
            port: 1883,
            username: None,
            password: None,
            client_id: "Error Module".to_string(),
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            topic: "blink".to_string(),
            format: PayloadFormat::Counted,
            interval_ms: None,
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            draw_max: 100,
            threshold: 25,
            max_code: 15,
        }
    }
}

impl MqttConfig {
    pub fn broker_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PublisherConfig {
    pub fn interval(&self) -> Duration {
        self.interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.format.default_interval())
    }
}

impl Config {
    /// Reads `fault_injector.toml` from the working directory, falling back to
    /// the built-in constants when the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }

        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| InjectorError::ConfigRead {
            path: display.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| InjectorError::ConfigParse {
            path: display,
            source,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
