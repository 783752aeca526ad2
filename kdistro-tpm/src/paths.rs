//! Context-directory layout, grounded in `pytpm/coretpm.py`'s `TPM2T_*`
//! path constants. File naming keeps the original's ordinal-suffix
//! convention (`extkey3.ctx`, `pkprim_pubenc5.dat`, ...) so that a
//! provisioned directory tree is recognizable against the source.

use std::path::{Path, PathBuf};

pub const PRIMARY_CTX_FILE: &str = "primary.ctx";

pub const ASYM_KEY_DIR: &str = "ASYMKEYCTX";
pub const ASYM_PUB_FILE: &str = "pubk.ctx";
pub const ASYM_PRV_FILE: &str = "prvk.ctx";
pub const ASYM_LOADED_FILE: &str = "loadedk.ctx";

pub const EXT_KEYSTORE_DIR: &str = "EXTKEYSTORE";
pub const EXT_KEY_PREFIX: &str = "extkey";
pub const EXT_KEY_EXT: &str = ".ctx";

pub const SEALED_KEY_DIR: &str = "KDISTROKEYS";
pub const SEALED_PUB_PREFIX: &str = "pkprim_pubenc";
pub const SEALED_SENS_PREFIX: &str = "pkprim_sensenc";
pub const SEALED_LOADED_PREFIX: &str = "pkprim_loaded";
pub const SEALED_WRAPPED_PREFIX: &str = "pkextenc";
pub const SEALED_SIGN_PREFIX: &str = "sign";
pub const SEALED_KEY_EXT: &str = ".dat";

pub const SCRATCH_RANDOM_FILE: &str = "tpmtemp1.dat";
pub const SCRATCH_HASH_FILE: &str = "tpmtemp2.dat";
pub const SCRATCH_TICKET_FILE: &str = "tpmtemp3.dat";
pub const SCRATCH_SIGDATA_FILE: &str = "tpmsigdata.dat";
pub const SCRATCH_SIGSIG_FILE: &str = "tpmsigsig.dat";
pub const SCRATCH_DEC_FILE: &str = "tpmdecf.dat";

/// Resolved absolute paths for one provisioned TPM context directory.
pub struct ContextLayout {
    pub root: PathBuf,
    pub primary_ctx: PathBuf,
    pub asym_dir: PathBuf,
    pub asym_pub: PathBuf,
    pub asym_prv: PathBuf,
    pub asym_loaded: PathBuf,
    pub ext_dir: PathBuf,
    pub sealed_dir: PathBuf,
}

impl ContextLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let asym_dir = root.join(ASYM_KEY_DIR);
        let sealed_dir = asym_dir.join(SEALED_KEY_DIR);
        Self {
            primary_ctx: root.join(PRIMARY_CTX_FILE),
            asym_pub: asym_dir.join(ASYM_PUB_FILE),
            asym_prv: asym_dir.join(ASYM_PRV_FILE),
            asym_loaded: asym_dir.join(ASYM_LOADED_FILE),
            ext_dir: root.join(EXT_KEYSTORE_DIR),
            sealed_dir,
            asym_dir,
            root,
        }
    }

    pub fn ext_key_path(&self, ordinal: u32) -> PathBuf {
        self.ext_dir
            .join(format!("{EXT_KEY_PREFIX}{ordinal}{EXT_KEY_EXT}"))
    }

    pub fn sealed_pub_path(&self, ordinal: u32) -> PathBuf {
        self.sealed_dir
            .join(format!("{SEALED_PUB_PREFIX}{ordinal}{SEALED_KEY_EXT}"))
    }

    pub fn sealed_sens_path(&self, ordinal: u32) -> PathBuf {
        self.sealed_dir
            .join(format!("{SEALED_SENS_PREFIX}{ordinal}{SEALED_KEY_EXT}"))
    }

    pub fn sealed_loaded_path(&self, ordinal: u32) -> PathBuf {
        self.sealed_dir
            .join(format!("{SEALED_LOADED_PREFIX}{ordinal}{SEALED_KEY_EXT}"))
    }

    pub fn sealed_wrapped_path(&self, ext_ordinal: u32) -> PathBuf {
        self.sealed_dir
            .join(format!("{SEALED_WRAPPED_PREFIX}{ext_ordinal}{SEALED_KEY_EXT}"))
    }

    pub fn sealed_sign_path(&self, ext_ordinal: u32) -> PathBuf {
        self.sealed_dir
            .join(format!("{SEALED_SIGN_PREFIX}{ext_ordinal}{SEALED_KEY_EXT}"))
    }

    pub fn scratch(&self, name: &str) -> PathBuf {
        self.sealed_dir.join(name)
    }

    pub fn ext_scratch(&self, name: &str) -> PathBuf {
        self.ext_dir.join(name)
    }
}

pub fn join(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}
