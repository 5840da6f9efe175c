use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::MqttConfig;
use crate::error::{InjectorError, Result};

/// Anything that can hand a payload to a broker.
#[async_trait]
pub trait Transport: Send {
    async fn publish(&mut self, topic: &str, payload: &str) -> Result<()>;
}

/// Opens the single broker connection used for the whole run.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    async fn connect(&self) -> Result<Self::Transport>;
}

pub struct MqttConnector {
    config: MqttConfig,
}

impl MqttConnector {
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }
}

pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut mqtt_options = MqttOptions::new(&config.client_id, &config.host, config.port);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        mqtt_options.set_credentials(username, password);
    }

    mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    mqtt_options.set_clean_session(true);
    mqtt_options
}

#[async_trait]
impl Connector for MqttConnector {
    type Transport = MqttPublisher;

    async fn connect(&self) -> Result<MqttPublisher> {
        let broker = self.config.broker_address();
        info!("Connecting to MQTT broker {}...", broker);

        let (client, mut eventloop) = AsyncClient::new(mqtt_options(&self.config), 10);
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);

        match tokio::time::timeout(timeout, wait_for_connack(&mut eventloop)).await {
            Ok(Ok(())) => info!("Connected to MQTT broker {}", broker),
            Ok(Err(reason)) => {
                error!("MQTT connection to {} failed: {}", broker, reason);
                return Err(InjectorError::Connection { broker, reason });
            }
            Err(_) => {
                error!("MQTT connection to {} timed out", broker);
                return Err(InjectorError::Connection {
                    broker,
                    reason: format!("no CONNACK within {:?}", timeout),
                });
            }
        }

        let (failure_sender, failure) = watch::channel(None);
        tokio::spawn(drive_eventloop(eventloop, failure_sender));

        Ok(MqttPublisher { client, failure })
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> std::result::Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                return if connack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(format!("broker refused connection: {:?}", connack.code))
                };
            }
            Ok(event) => debug!("MQTT event before CONNACK: {:?}", event),
            Err(e) => return Err(e.to_string()),
        }
    }
}

/// Polls the event loop so queued publishes reach the socket. Stops at the
/// first error and reports it; there is no reconnect.
async fn drive_eventloop(mut eventloop: EventLoop, failure: watch::Sender<Option<String>>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(packet)) => debug!("Outgoing MQTT packet: {:?}", packet),
            Ok(event) => debug!("MQTT event: {:?}", event),
            Err(e) => {
                error!("MQTT eventloop error: {}", e);
                let _ = failure.send(Some(e.to_string()));
                break;
            }
        }
    }
}

/// Publishes through a connected rumqttc client at QoS 0.
pub struct MqttPublisher {
    client: AsyncClient,
    failure: watch::Receiver<Option<String>>,
}

#[async_trait]
impl Transport for MqttPublisher {
    async fn publish(&mut self, topic: &str, payload: &str) -> Result<()> {
        let failure = self.failure.borrow().clone();
        if let Some(reason) = failure {
            return Err(InjectorError::Transport(reason));
        }

        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mqtt_options_from_config() {
        let config = MqttConfig::default();
        let options = mqtt_options(&config);
        assert_eq!(options.client_id(), "Error Module");
        assert_eq!(
            options.broker_address(),
            ("mqtt.eclipseprojects.io".to_string(), 1883)
        );
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = MqttConfig {
            host: "127.0.0.1".to_string(),
            port,
            connect_timeout_secs: 5,
            ..MqttConfig::default()
        };
        let result = MqttConnector::new(config).connect().await;
        match result {
            Err(InjectorError::Connection { broker, .. }) => {
                assert_eq!(broker, format!("127.0.0.1:{}", port));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }

    #[tokio::test]
    async fn test_silent_broker_times_out() {
        // Accepts TCP but never answers CONNECT.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _accept = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = MqttConfig {
            host: "127.0.0.1".to_string(),
            port,
            connect_timeout_secs: 1,
            ..MqttConfig::default()
        };
        let result = MqttConnector::new(config).connect().await;
        assert!(matches!(result, Err(InjectorError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_publish_reports_eventloop_failure() {
        let options = MqttOptions::new("test", "127.0.0.1", 1883);
        let (client, _eventloop) = AsyncClient::new(options, 10);
        let (sender, failure) = watch::channel(None);
        sender.send(Some("connection reset".to_string())).unwrap();

        let mut publisher = MqttPublisher { client, failure };
        let result = publisher.publish("blink", "{}").await;
        assert!(matches!(result, Err(InjectorError::Transport(reason)) if reason == "connection reset"));
    }
}
