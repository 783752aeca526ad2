//! Slave receive loop and key unwrap, grounded in
//! `slave_core/slave_mngr.py`'s `SlaveMngr`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kdistro_can::{CanLink, CanTransport, LtkReassembler, StkReassembler};
use kdistro_crypto::MemCrypto;
use kdistro_mqtt::MqttPublisher;
use kdistro_tpm::{ExtKeyOrdinal, KeyStore};
use tracing::{debug, error, info, warn};

use crate::error::OrchestratorError;

/// Minimum decrypted STK envelope length: 4-byte little-endian index plus a
/// non-empty key. The spec additionally requires at least 32 bytes total
/// once the index prefix is accounted for.
const STK_ENVELOPE_MIN_LEN: usize = 32;

/// Blocks on the CAN bus, reassembles LTK and STK fragment streams, and
/// unwraps each delivery as it completes. The STK is republished locally
/// over MQTT once unwrapped.
pub struct SlaveOrchestrator<T: CanTransport> {
    keystore: KeyStore,
    can: CanLink<T>,
    ltk_reassembler: LtkReassembler,
    stk_reassembler: StkReassembler,
    ext_pub_key_idx: ExtKeyOrdinal,

    ltk_key: Option<Vec<u8>>,
    stk_idx: u32,
    stk_key: Option<Vec<u8>>,

    mqtt: Option<MqttPublisher>,

    should_stop: Arc<AtomicBool>,
}

impl<T: CanTransport> SlaveOrchestrator<T> {
    pub fn new(
        keystore: KeyStore,
        transport: T,
        ltk_reassembler: LtkReassembler,
        stk_reassembler: StkReassembler,
        ext_pub_key_idx: ExtKeyOrdinal,
        mqtt: Option<MqttPublisher>,
    ) -> Self {
        Self {
            keystore,
            can: CanLink::new(transport),
            ltk_reassembler,
            stk_reassembler,
            ext_pub_key_idx,
            ltk_key: None,
            stk_idx: 0,
            stk_key: None,
            mqtt,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.should_stop.clone()
    }

    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    /// Blocks on the CAN bus (100ms recv timeout) until told to stop,
    /// matching `run_mngr_loop`'s unthrottled `recv_msg()` calls.
    pub fn run_loop(&mut self) {
        info!("SlaveOrchestrator: starting main loop");

        while !self.should_stop.load(Ordering::SeqCst) {
            match self.can.recv(100) {
                Ok(Some(frame)) => {
                    if let Err(e) = self.on_frame(&frame) {
                        error!(error = %e, "SlaveOrchestrator: error handling frame");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "SlaveOrchestrator: CAN receive error"),
            }
        }

        info!("SlaveOrchestrator: main loop stopped");
    }

    fn on_frame(&mut self, frame: &kdistro_can::CanFrame) -> Result<(), OrchestratorError> {
        if let Some((wrapped, signature)) = self.ltk_reassembler.on_frame(frame)? {
            self.on_new_ltk(&wrapped, &signature)?;
            return Ok(());
        }
        if let Some(envelope) = self.stk_reassembler.on_frame(frame)? {
            self.on_new_stk(&envelope)?;
        }
        Ok(())
    }

    fn on_new_ltk(&mut self, wrapped: &[u8], signature: &[u8]) -> Result<(), OrchestratorError> {
        let verified = self.keystore.verify_signature(wrapped, signature, self.ext_pub_key_idx)?;
        if !verified {
            error!("SlaveOrchestrator: LTK signature did not verify, discarding");
            return Ok(());
        }
        info!("SlaveOrchestrator: LTK signature verified");

        let key = self.keystore.rsa_decrypt(wrapped)?;
        debug!(len = key.len(), "SlaveOrchestrator: LTK decrypted");
        self.ltk_key = Some(key);
        Ok(())
    }

    fn on_new_stk(&mut self, envelope: &[u8]) -> Result<(), OrchestratorError> {
        let Some(ltk_key) = self.ltk_key.as_ref() else {
            error!("SlaveOrchestrator: got new STK but no LTK yet");
            return Ok(());
        };

        let mut mem_crypto = MemCrypto::new();
        mem_crypto.initialize_with_key(ltk_key)?;
        let key_data = mem_crypto.decrypt(envelope)?;

        if key_data.len() < STK_ENVELOPE_MIN_LEN {
            error!(len = key_data.len(), "SlaveOrchestrator: STK envelope too short");
            return Ok(());
        }

        let mut idx_bytes = [0u8; 4];
        idx_bytes.copy_from_slice(&key_data[0..4]);
        self.stk_idx = u32::from_le_bytes(idx_bytes);
        self.stk_key = Some(key_data[4..].to_vec());

        debug!(stk_idx = self.stk_idx, "SlaveOrchestrator: new STK received");

        if let Some(mqtt) = &self.mqtt {
            mqtt.publish_key(self.stk_key.as_ref().unwrap());
        }
        Ok(())
    }
}
