//! Master rotation scheduler, grounded in `master_core/master_mngr.py`'s
//! `MasterMngr`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kdistro_can::{CanIds, CanLink, CanTransport};
use kdistro_crypto::{mint_key_material, MemCrypto};
use kdistro_tpm::{ExtKeyOrdinal, KeyStore, SealedKeyOrdinal};
use tracing::{error, info};

use crate::error::OrchestratorError;

/// Generates and rotates the LTK, then rotates an LTK-wrapped STK on a
/// faster cadence, republishing both over CAN. One 1-second tick per
/// [`Self::tick`] call, matching `run_mngr_loop`'s `time.sleep(1)` cadence.
pub struct MasterOrchestrator<T: CanTransport> {
    keystore: KeyStore,
    can: CanLink<T>,
    ids: CanIds,
    ext_pub_key_idx: ExtKeyOrdinal,
    ltk_size_bytes: usize,
    ltk_cycle: u32,
    stk_cycle: u32,

    counter_ltk: u32,
    counter_stk: u32,
    ltk_idx: Option<SealedKeyOrdinal>,
    ltk_key: Option<Vec<u8>>,
    stk_idx: u32,
    stk_pub_data: Option<Vec<u8>>,

    should_stop: Arc<AtomicBool>,
}

impl<T: CanTransport> MasterOrchestrator<T> {
    pub fn new(
        keystore: KeyStore,
        transport: T,
        ids: CanIds,
        ext_pub_key_idx: ExtKeyOrdinal,
        ltk_size_bytes: usize,
        ltk_cycle: u32,
        stk_cycle: u32,
    ) -> Self {
        Self {
            keystore,
            can: CanLink::new(transport),
            ids,
            ext_pub_key_idx,
            ltk_size_bytes,
            ltk_cycle: ltk_cycle.max(1),
            stk_cycle: stk_cycle.max(1),
            counter_ltk: 0,
            counter_stk: 0,
            ltk_idx: None,
            ltk_key: None,
            stk_idx: 0,
            stk_pub_data: None,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clone of the stop flag. `true` requests shutdown — this is the
    /// polarity `signal_hook::flag::register` expects, so it can be handed
    /// straight to a `SIGINT`/`SIGTERM`/`SIGQUIT` registration.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.should_stop.clone()
    }

    pub fn run_loop(&mut self) {
        info!("MasterOrchestrator: starting main loop");

        while !self.should_stop.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_secs(1));

            if let Err(e) = self.gen_ltk() {
                error!(error = %e, "MasterOrchestrator: LTK rotation failed");
            }
            if let Err(e) = self.gen_stk() {
                error!(error = %e, "MasterOrchestrator: STK rotation failed");
            }
        }

        info!("MasterOrchestrator: main loop stopped");
    }

    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    /// Every `ltk_cycle` ticks: mint (once) an LTK, then export and
    /// retransmit it every time this fires. Policy choice: once minted the
    /// LTK is never regenerated on its own — only an explicit re-provision
    /// restarts it — so a late-joining Slave that missed the original
    /// broadcast still gets it on the next cycle.
    fn gen_ltk(&mut self) -> Result<(), OrchestratorError> {
        self.counter_ltk += 1;
        if self.counter_ltk % self.ltk_cycle != 0 {
            return Ok(());
        }

        if self.ltk_idx.is_none() {
            let idx = self.keystore.generate_sealed_sym_key(self.ltk_size_bytes)?;
            self.ltk_idx = Some(idx);
            // Wraps to 0 on the first `wrapping_add(1)` in `gen_stk`, so the
            // first STK minted under a new LTK epoch carries index 0.
            self.stk_idx = u32::MAX;
            self.ltk_key = None;
            self.stk_pub_data = None;
        }

        let ltk_idx = self.ltk_idx.expect("just set");
        let (wrapped, signature) = self.keystore.export_sealed_sym_key(self.ext_pub_key_idx, ltk_idx)?;

        info!(wrapped_len = wrapped.len(), sig_len = signature.len(), "MasterOrchestrator: LTK exported");
        self.can.send_fragmented(self.ids.ltk_pub, &wrapped)?;
        self.can.send_fragmented(self.ids.ltk_sig, &signature)?;
        Ok(())
    }

    /// Every `stk_cycle` ticks: if no LTK exists yet, do nothing. Otherwise
    /// mint (or reuse, within a `2 * stk_cycle`-tick window) a fresh STK,
    /// wrap it with the LTK, and (re)transmit it.
    fn gen_stk(&mut self) -> Result<(), OrchestratorError> {
        let Some(ltk_idx) = self.ltk_idx else {
            return Ok(());
        };

        self.counter_stk += 1;
        if self.counter_stk % self.stk_cycle != 0 {
            return Ok(());
        }

        if self.ltk_key.is_none() {
            self.ltk_key = Some(self.keystore.memory_export_sealed_key(ltk_idx)?);
        }

        if self.counter_stk % (self.stk_cycle * 2) == 0 {
            self.stk_pub_data = None;
        }

        if self.stk_pub_data.is_none() {
            let ltk_key = self.ltk_key.as_ref().expect("just set");
            let mut mem_crypto = MemCrypto::new();
            mem_crypto.initialize_with_key(ltk_key)?;

            let stk_material = mint_key_material()?;
            self.stk_idx = self.stk_idx.wrapping_add(1);

            let mut out_data = Vec::with_capacity(4 + stk_material.len());
            out_data.extend_from_slice(&self.stk_idx.to_le_bytes());
            out_data.extend_from_slice(&stk_material);

            self.stk_pub_data = Some(mem_crypto.encrypt(&out_data)?);
            info!(stk_idx = self.stk_idx, "MasterOrchestrator: new STK generated");
        }

        let payload = self.stk_pub_data.as_ref().expect("just set");
        self.can.send_fragmented(self.ids.stk, payload)?;
        Ok(())
    }
}
