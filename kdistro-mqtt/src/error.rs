//! Error types for `kdistro-mqtt`.

use std::fmt;

#[derive(Debug)]
pub enum MqttError {
    Connect(rumqttc::ConnectionError),
    Publish(rumqttc::ClientError),
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "MQTT connection failed: {e}"),
            Self::Publish(e) => write!(f, "MQTT publish failed: {e}"),
        }
    }
}

impl std::error::Error for MqttError {}

impl From<rumqttc::ClientError> for MqttError {
    fn from(e: rumqttc::ClientError) -> Self {
        Self::Publish(e)
    }
}
