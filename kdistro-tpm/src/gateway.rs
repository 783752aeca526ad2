//! Thin subprocess wrapper around the `tpm2-tools` binaries, grounded in
//! `pytpm/tpm2tools.py`. Each call shells out to one `tpm2_*` argv and maps
//! a clean exit to `Ok(())`; no stdout/stderr parsing beyond the exit
//! status, matching the source's `returncode == 0` checks.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::TpmError;

const TCTI_ABRMD: &str = "--tcti=tabrmd:bus_name=com.intel.tss2.Tabrmd";

/// Drives the local `tpm2-tools` CLI. Stateless: every method takes the
/// context-file paths it needs and returns once the child exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct TpmGateway;

impl TpmGateway {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, tool: &'static str, args: &[&std::ffi::OsStr]) -> Result<(), TpmError> {
        debug!(tool, ?args, "spawning tpm2 tool");
        let status = Command::new(tool)
            .args(args)
            .arg(TCTI_ABRMD)
            .status()
            .map_err(|source| TpmError::Spawn { tool, source })?;
        if !status.success() {
            warn!(tool, status = ?status, "tpm2 tool exited non-zero");
            return Err(TpmError::ToolFailed {
                tool,
                status: status.code(),
            });
        }
        Ok(())
    }

    /// `tpm2_createprimary -c <out>`: provisions the endorsement primary key.
    pub fn create_primary(&self, out_ctx: &Path) -> Result<(), TpmError> {
        if let Some(parent) = out_ctx.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        self.run(
            "tpm2_createprimary",
            &["-c".as_ref(), out_ctx.as_os_str()],
        )
    }

    /// `tpm2_create -C <parent> -u <pub> -r <priv>`: a loadable key pair
    /// under the primary.
    pub fn create_asym_key(&self, parent_ctx: &Path, pub_out: &Path, priv_out: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_create",
            &[
                "-C".as_ref(),
                parent_ctx.as_os_str(),
                "-u".as_ref(),
                pub_out.as_os_str(),
                "-r".as_ref(),
                priv_out.as_os_str(),
            ],
        )
    }

    /// `tpm2_load -C <parent> -u <pub> -r <priv> -c <out>`.
    pub fn load(&self, parent_ctx: &Path, pub_in: &Path, priv_in: &Path, out_ctx: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_load",
            &[
                "-C".as_ref(),
                parent_ctx.as_os_str(),
                "-u".as_ref(),
                pub_in.as_os_str(),
                "-r".as_ref(),
                priv_in.as_os_str(),
                "-c".as_ref(),
                out_ctx.as_os_str(),
            ],
        )
    }

    /// `tpm2_loadexternal -C n -u <pub> [-G <alg>] -c <out>`: loads a
    /// foreign public key into the NULL hierarchy.
    pub fn load_external_pub_key(&self, pub_file: &Path, out_ctx: &Path, alg: Option<&str>) -> Result<(), TpmError> {
        if let Some(parent) = out_ctx.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        match alg {
            Some(alg) => self.run(
                "tpm2_loadexternal",
                &[
                    "-C".as_ref(),
                    "n".as_ref(),
                    "-u".as_ref(),
                    pub_file.as_os_str(),
                    "-G".as_ref(),
                    alg.as_ref(),
                    "-c".as_ref(),
                    out_ctx.as_os_str(),
                ],
            ),
            None => self.run(
                "tpm2_loadexternal",
                &[
                    "-C".as_ref(),
                    "n".as_ref(),
                    "-u".as_ref(),
                    pub_file.as_os_str(),
                    "-c".as_ref(),
                    out_ctx.as_os_str(),
                ],
            ),
        }
    }

    /// `tpm2_getrandom -o <out> <count>`.
    pub fn get_random(&self, byte_count: usize, out_file: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_getrandom",
            &[
                "-o".as_ref(),
                out_file.as_os_str(),
                byte_count.to_string().as_ref(),
            ],
        )
    }

    /// `tpm2_rsaencrypt -c <key> -o <out> <in>`.
    pub fn rsa_encrypt(&self, key_ctx: &Path, in_file: &Path, out_file: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_rsaencrypt",
            &[
                "-c".as_ref(),
                key_ctx.as_os_str(),
                "-o".as_ref(),
                out_file.as_os_str(),
                in_file.as_os_str(),
            ],
        )
    }

    /// `tpm2_rsadecrypt -c <key> -o <out> <in>`.
    pub fn rsa_decrypt(&self, key_ctx: &Path, in_file: &Path, out_file: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_rsadecrypt",
            &[
                "-c".as_ref(),
                key_ctx.as_os_str(),
                "-o".as_ref(),
                out_file.as_os_str(),
                in_file.as_os_str(),
            ],
        )
    }

    /// `tpm2_sign -c <key> -g sha256 -o <out> <in>`.
    pub fn sign(&self, key_ctx: &Path, in_file: &Path, out_file: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_sign",
            &[
                "-c".as_ref(),
                key_ctx.as_os_str(),
                "-g".as_ref(),
                "sha256".as_ref(),
                "-o".as_ref(),
                out_file.as_os_str(),
                in_file.as_os_str(),
            ],
        )
    }

    /// `tpm2_verifysignature -c <key> -g sha256 -m <data> -s <sig>`.
    ///
    /// Unlike the other wrappers, a non-zero exit here means "signature did
    /// not verify", not a tool failure — so it is reported as `Ok(false)`
    /// rather than `Err`, matching the source's `returncode == 0` boolean.
    pub fn verify(&self, key_ctx: &Path, data_file: &Path, sig_file: &Path) -> Result<bool, TpmError> {
        const TOOL: &str = "tpm2_verifysignature";
        let status = Command::new(TOOL)
            .arg("-c")
            .arg(key_ctx)
            .arg("-g")
            .arg("sha256")
            .arg("-m")
            .arg(data_file)
            .arg("-s")
            .arg(sig_file)
            .arg(TCTI_ABRMD)
            .status()
            .map_err(|source| TpmError::Spawn { tool: TOOL, source })?;
        Ok(status.success())
    }

    /// `tpm2_create -C <parent> -i <in> -u <pub> -r <priv>`: seals a blob
    /// of arbitrary data (reuses the create-key argv, same as the source).
    pub fn seal(&self, parent_ctx: &Path, in_file: &Path, pub_out: &Path, priv_out: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_create",
            &[
                "-C".as_ref(),
                parent_ctx.as_os_str(),
                "-i".as_ref(),
                in_file.as_os_str(),
                "-u".as_ref(),
                pub_out.as_os_str(),
                "-r".as_ref(),
                priv_out.as_os_str(),
            ],
        )
    }

    /// `tpm2_unseal -c <loaded> -o <out>`.
    pub fn unseal(&self, loaded_ctx: &Path, out_file: &Path) -> Result<(), TpmError> {
        self.run(
            "tpm2_unseal",
            &["-c".as_ref(), loaded_ctx.as_os_str(), "-o".as_ref(), out_file.as_os_str()],
        )
    }

    /// `tpm2_flushcontext -t`: drops all transient objects.
    pub fn flush_context(&self) -> Result<(), TpmError> {
        self.run("tpm2_flushcontext", &["-t".as_ref()])
    }

    /// `tpm2_dictionarylockout --setup-parameters --max-tries=<n> --clear-lockout`.
    pub fn dictionary_lockout_reset(&self) -> Result<(), TpmError> {
        self.run(
            "tpm2_dictionarylockout",
            &[
                "--setup-parameters".as_ref(),
                "--max-tries=4294967295".as_ref(),
                "--clear-lockout".as_ref(),
            ],
        )
    }
}
