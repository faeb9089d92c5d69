//! Domain error types.

use crate::domain::universe::UniverseError;

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("insufficient data for {code}: {reason}")]
    InsufficientData { code: String, reason: String },

    #[error("data integrity error for {code}: {reason}")]
    DataIntegrity { code: String, reason: String },

    #[error("pipeline failure for {code}: {reason}")]
    Pipeline { code: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub fn insufficient(code: &str, reason: impl Into<String>) -> Self {
        SigtraderError::InsufficientData {
            code: code.to_string(),
            reason: reason.into(),
        }
    }

    pub fn integrity(code: &str, reason: impl Into<String>) -> Self {
        SigtraderError::DataIntegrity {
            code: code.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) | SigtraderError::Report { .. } => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. }
            | SigtraderError::Universe(_) => 2,
            SigtraderError::DataSource { .. } => 3,
            SigtraderError::DataIntegrity { .. } | SigtraderError::Pipeline { .. } => 4,
            SigtraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
