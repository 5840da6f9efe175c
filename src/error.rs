use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectorError {
    /// Startup connection to the broker failed. Never retried.
    #[error("failed to connect to MQTT broker {broker}: {reason}")]
    Connection { broker: String, reason: String },

    #[error("failed to queue publish: {0}")]
    Publish(#[from] rumqttc::ClientError),

    /// The background event loop lost the connection after startup.
    #[error("MQTT transport failed: {0}")]
    Transport(String),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write payload line: {0}")]
    Echo(std::io::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: String,
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, InjectorError>;
