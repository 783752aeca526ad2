//! Error types for `kdistro-config`.

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    Read { path: String, source: ini::Error },
    MissingSection(&'static str),
    MissingKey { section: &'static str, key: &'static str },
    InvalidValue { section: &'static str, key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "failed to read config {path}: {source}"),
            Self::MissingSection(s) => write!(f, "missing configuration section [{s}]"),
            Self::MissingKey { section, key } => {
                write!(f, "missing key '{key}' in section [{section}]")
            }
            Self::InvalidValue { section, key, value } => write!(
                f,
                "invalid value '{value}' for key '{key}' in section [{section}]"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
