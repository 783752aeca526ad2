//! Error types for `kdistro-tpm`.

use std::fmt;
use std::path::PathBuf;

/// Failures from [`crate::gateway::TpmGateway`] and [`crate::keystore::KeyStore`].
#[derive(Debug)]
pub enum TpmError {
    /// A `tpm2_*` child process could not be spawned at all (binary missing,
    /// permission denied, etc).
    Spawn { tool: &'static str, source: std::io::Error },
    /// A `tpm2_*` child process ran but exited non-zero.
    ToolFailed { tool: &'static str, status: Option<i32> },
    /// A context-directory path expected to exist was missing.
    MissingContext(PathBuf),
    /// An ordinal referenced an entry not present in the registry.
    UnknownOrdinal(u32),
    /// A scratch file holding plaintext key material could not be read back
    /// or deleted.
    Scratch { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for TpmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { tool, source } => write!(f, "failed to spawn {tool}: {source}"),
            Self::ToolFailed { tool, status } => match status {
                Some(code) => write!(f, "{tool} exited with status {code}"),
                None => write!(f, "{tool} was terminated by a signal"),
            },
            Self::MissingContext(path) => write!(f, "missing TPM context: {}", path.display()),
            Self::UnknownOrdinal(ord) => write!(f, "unknown key ordinal: {ord}"),
            Self::Scratch { path, source } => {
                write!(f, "scratch file {} failed: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TpmError {}
