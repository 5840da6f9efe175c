mod config;
mod error;
mod injector;
mod mqtt;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use injector::{connect_and_run, RngDraws, TokioTicker};
use mqtt::MqttConnector;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries only the payload lines, so diagnostics go to a file
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("mqtt_fault_injector.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    info!("Starting MQTT fault injector");

    let config = Config::load()?;
    info!("Configuration loaded: {:?}", config);

    let connector = MqttConnector::new(config.mqtt.clone());
    let result = connect_and_run(
        &connector,
        &config,
        TokioTicker,
        RngDraws::from_entropy(),
        Box::new(std::io::stdout()),
    )
    .await;

    match result {
        Ok(never) => match never {},
        Err(e) => {
            error!("Fault injector stopped: {}", e);
            Err(e.into())
        }
    }
}
