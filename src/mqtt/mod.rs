pub mod client;

pub use client::{Connector, MqttConnector, Transport};
