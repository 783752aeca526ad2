//! Ordinal-indexed key registry backed by a provisioned TPM context
//! directory, grounded in `pytpm/coretpm.py`'s `CoreTPM`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::TpmError;
use crate::gateway::TpmGateway;
use crate::paths::{self, ContextLayout};
use crate::scratch::ScratchFile;
use crate::types::{ExtKeyOrdinal, SealedKeyOrdinal};

/// Owns the context-directory layout and the ordinal → path registries for
/// external (peer) public keys and TPM-sealed symmetric keys.
pub struct KeyStore {
    gateway: TpmGateway,
    layout: ContextLayout,
    ext_keys: HashMap<u32, PathBuf>,
    next_ext: ExtKeyOrdinal,
    sealed_keys: HashMap<u32, (PathBuf, PathBuf)>,
    next_sealed: SealedKeyOrdinal,
}

impl KeyStore {
    /// Open a keystore over an already-provisioned context directory.
    /// Does not provision; call [`Self::provision`] for a fresh root.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            gateway: TpmGateway::new(),
            layout: ContextLayout::new(root),
            ext_keys: HashMap::new(),
            next_ext: ExtKeyOrdinal::first(),
            sealed_keys: HashMap::new(),
            next_sealed: SealedKeyOrdinal::first(),
        }
    }

    /// Provision a fresh endorsement primary and a loadable asymmetric key
    /// pair under it, mirroring `CoreTPM.provision_core`.
    pub fn provision(&mut self) -> Result<(), TpmError> {
        self.gateway.flush_context()?;
        self.gateway.create_primary(&self.layout.primary_ctx)?;
        std::fs::create_dir_all(&self.layout.asym_dir).map_err(|source| TpmError::Scratch {
            path: self.layout.asym_dir.clone(),
            source,
        })?;
        self.gateway
            .create_asym_key(&self.layout.primary_ctx, &self.layout.asym_pub, &self.layout.asym_prv)?;
        self.gateway.load(
            &self.layout.primary_ctx,
            &self.layout.asym_pub,
            &self.layout.asym_prv,
            &self.layout.asym_loaded,
        )?;
        std::fs::create_dir_all(&self.layout.sealed_dir).map_err(|source| TpmError::Scratch {
            path: self.layout.sealed_dir.clone(),
            source,
        })?;
        std::fs::create_dir_all(&self.layout.ext_dir).map_err(|source| TpmError::Scratch {
            path: self.layout.ext_dir.clone(),
            source,
        })?;
        info!(root = %self.layout.root.display(), "TPM context provisioned");
        Ok(())
    }

    /// Reset the dictionary-attack lockout counter, mirroring
    /// `CoreTPM.load_post_provision`'s unconditional call before reload.
    pub fn reset_lockout(&self) -> Result<(), TpmError> {
        self.gateway.dictionary_lockout_reset()
    }

    /// `tpm2_loadexternal` a peer's public key into the NULL hierarchy and
    /// register it under a fresh ordinal.
    pub fn load_external_key(&mut self, pub_key_file: &Path, alg: Option<&str>) -> Result<ExtKeyOrdinal, TpmError> {
        let ordinal = self.next_ext;
        let ctx_path = self.layout.ext_key_path(ordinal.get());
        self.gateway.load_external_pub_key(pub_key_file, &ctx_path, alg)?;
        self.ext_keys.insert(ordinal.get(), ctx_path);
        self.next_ext = ordinal.next();
        Ok(ordinal)
    }

    fn ext_key_path(&self, ordinal: ExtKeyOrdinal) -> Result<&Path, TpmError> {
        self.ext_keys
            .get(&ordinal.get())
            .map(PathBuf::as_path)
            .ok_or(TpmError::UnknownOrdinal(ordinal.get()))
    }

    /// Generate a fresh random key of `key_size` bytes, seal it under the
    /// primary key, and register it under a fresh ordinal. The plaintext
    /// touches disk only inside a [`ScratchFile`] guard.
    pub fn generate_sealed_sym_key(&mut self, key_size: usize) -> Result<SealedKeyOrdinal, TpmError> {
        let ordinal = self.next_sealed;
        let random_scratch = ScratchFile::new(self.layout.scratch(paths::SCRATCH_RANDOM_FILE));
        self.gateway.get_random(key_size, random_scratch.path())?;

        let pub_path = self.layout.sealed_pub_path(ordinal.get());
        let sens_path = self.layout.sealed_sens_path(ordinal.get());
        self.gateway
            .seal(&self.layout.primary_ctx, random_scratch.path(), &pub_path, &sens_path)?;

        self.sealed_keys.insert(ordinal.get(), (pub_path, sens_path));
        self.next_sealed = ordinal.next();
        Ok(ordinal)
    }

    /// Unseal a previously generated key, RSA-wrap it for the named external
    /// key, and sign the wrapped ciphertext. Returns `(wrapped, signature)`.
    pub fn export_sealed_sym_key(
        &self,
        ext_ordinal: ExtKeyOrdinal,
        sealed_ordinal: SealedKeyOrdinal,
    ) -> Result<(Vec<u8>, Vec<u8>), TpmError> {
        let ext_ctx = self.ext_key_path(ext_ordinal)?.to_path_buf();
        let (pub_path, sens_path) = self
            .sealed_keys
            .get(&sealed_ordinal.get())
            .ok_or(TpmError::UnknownOrdinal(sealed_ordinal.get()))?;

        let loaded_path = self.layout.sealed_loaded_path(sealed_ordinal.get());
        self.gateway
            .load(&self.layout.primary_ctx, pub_path, sens_path, &loaded_path)?;

        let unsealed = ScratchFile::new(self.layout.scratch(paths::SCRATCH_RANDOM_FILE));
        self.gateway.unseal(&loaded_path, unsealed.path())?;

        let wrapped_path = self.layout.sealed_wrapped_path(ext_ordinal.get());
        self.gateway.rsa_encrypt(&ext_ctx, unsealed.path(), &wrapped_path)?;
        drop(unsealed);

        let sign_path = self.layout.sealed_sign_path(ext_ordinal.get());
        self.gateway
            .sign(&self.layout.asym_loaded, &wrapped_path, &sign_path)?;

        let wrapped = std::fs::read(&wrapped_path).map_err(|source| TpmError::Scratch {
            path: wrapped_path,
            source,
        })?;
        let signature = std::fs::read(&sign_path).map_err(|source| TpmError::Scratch {
            path: sign_path,
            source,
        })?;
        Ok((wrapped, signature))
    }

    /// Unseal a key and hand its raw bytes back to the caller in memory,
    /// mirroring `CoreTPM.memory_export_sealed_key`. Used by the Master to
    /// seed a fresh `MemCrypto` with a TPM-backed key without a network hop.
    pub fn memory_export_sealed_key(&self, sealed_ordinal: SealedKeyOrdinal) -> Result<Vec<u8>, TpmError> {
        let (pub_path, sens_path) = self
            .sealed_keys
            .get(&sealed_ordinal.get())
            .ok_or(TpmError::UnknownOrdinal(sealed_ordinal.get()))?;

        let loaded_path = self.layout.sealed_loaded_path(sealed_ordinal.get());
        self.gateway
            .load(&self.layout.primary_ctx, pub_path, sens_path, &loaded_path)?;

        let unsealed = ScratchFile::new(self.layout.scratch(paths::SCRATCH_RANDOM_FILE));
        self.gateway.unseal(&loaded_path, unsealed.path())?;

        std::fs::read(unsealed.path()).map_err(|source| TpmError::Scratch {
            path: unsealed.path().to_path_buf(),
            source,
        })
    }

    /// RSA-decrypt `ciphertext` under our own loaded asymmetric key.
    pub fn rsa_decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, TpmError> {
        let data_scratch = ScratchFile::new(self.layout.ext_scratch(paths::SCRATCH_SIGDATA_FILE));
        std::fs::write(data_scratch.path(), ciphertext).map_err(|source| TpmError::Scratch {
            path: data_scratch.path().to_path_buf(),
            source,
        })?;

        let out_scratch = ScratchFile::new(self.layout.ext_scratch(paths::SCRATCH_DEC_FILE));
        self.gateway
            .rsa_decrypt(&self.layout.asym_loaded, data_scratch.path(), out_scratch.path())?;

        std::fs::read(out_scratch.path()).map_err(|source| TpmError::Scratch {
            path: out_scratch.path().to_path_buf(),
            source,
        })
    }

    /// Verify `signature` over `data` against a registered external key.
    /// Returns `Ok(false)` for a bad signature, `Err` only for a broken
    /// toolchain invocation.
    pub fn verify_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        ext_ordinal: ExtKeyOrdinal,
    ) -> Result<bool, TpmError> {
        let ext_ctx = self.ext_key_path(ext_ordinal)?;

        let data_scratch = ScratchFile::new(self.layout.ext_scratch(paths::SCRATCH_SIGDATA_FILE));
        std::fs::write(data_scratch.path(), data).map_err(|source| TpmError::Scratch {
            path: data_scratch.path().to_path_buf(),
            source,
        })?;
        let sig_scratch = ScratchFile::new(self.layout.ext_scratch(paths::SCRATCH_SIGSIG_FILE));
        std::fs::write(sig_scratch.path(), signature).map_err(|source| TpmError::Scratch {
            path: sig_scratch.path().to_path_buf(),
            source,
        })?;

        self.gateway.verify(ext_ctx, data_scratch.path(), sig_scratch.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_start_at_one_and_increase() {
        let a = ExtKeyOrdinal::first();
        assert_eq!(a.get(), 1);
        assert_eq!(a.next().get(), 2);
    }

    #[test]
    fn opening_a_fresh_store_has_no_registered_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::open(dir.path());
        let err = store.export_sealed_sym_key(ExtKeyOrdinal::first(), SealedKeyOrdinal::first());
        assert!(matches!(err, Err(TpmError::UnknownOrdinal(_))));
    }
}
