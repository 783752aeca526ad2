//! Fire-and-forget STK republish over MQTT, grounded in
//! `slave_core/client_mqtt.py`'s `paho-mqtt` wrapper. Publishes are
//! best-effort: a disconnected broker logs a warning and is not treated as
//! a fatal error, matching the source's `publish_key` returning `False`
//! rather than raising.

mod error;

use std::thread::JoinHandle;
use std::time::Duration;

pub use error::MqttError;
use rumqttc::{Client, Connection, Event, MqttOptions, Outgoing, QoS};
use tracing::{debug, error, info, warn};

const KEY_TOPIC: &str = "keymanager_stk/";

/// Owns a synchronous `rumqttc` client and the background thread that
/// drives its event loop.
pub struct MqttPublisher {
    client: Client,
    driver: Option<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Connect to `host:port` with the given credentials and start the
    /// background polling thread, mirroring `MQTTClient.connect`'s
    /// `loop_start()` + `connect()` pair.
    pub fn connect(client_id: &str, user: &str, password: &str, host: &str, port: u16) -> Self {
        let mut opts = MqttOptions::new(client_id, host, port);
        opts.set_credentials(user, password);
        opts.set_keep_alive(Duration::from_secs(60));

        let (client, connection) = Client::new(opts, 16);
        let driver = std::thread::spawn(move || Self::drive(connection));

        info!(host, port, "MqttPublisher: connecting");
        Self {
            client,
            driver: Some(driver),
        }
    }

    fn drive(mut connection: Connection) {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(rumqttc::Packet::ConnAck(ack))) => {
                    info!(code = ?ack.code, "MqttPublisher: client connected");
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!("MqttPublisher: event loop shutting down");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "MqttPublisher: connection error, rumqttc will retry");
                }
            }
        }
    }

    /// Publish `key` to `keymanager_stk/` at QoS 0. Logs and swallows a
    /// broker-side failure rather than propagating it — losing one STK
    /// republish is not fatal, the next rotation will retry.
    pub fn publish_key(&self, key: &[u8]) {
        match self.client.publish(KEY_TOPIC, QoS::AtMostOnce, false, key) {
            Ok(()) => debug!(len = key.len(), "MqttPublisher: published STK"),
            Err(e) => error!(error = %e, "MqttPublisher: publish failed"),
        }
    }

    /// Disconnect and stop the background event loop.
    pub fn stop(mut self) {
        if let Err(e) = self.client.disconnect() {
            warn!(error = %e, "MqttPublisher: disconnect failed");
        }
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}
