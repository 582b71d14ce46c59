//! Domain error types.

/// Top-level error type for renkotrader.
#[derive(Debug, thiserror::Error)]
pub enum RenkoError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("alignment error: {reason}")]
    Alignment { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenkoError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        RenkoError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&RenkoError> for std::process::ExitCode {
    fn from(err: &RenkoError) -> Self {
        let code: u8 = match err {
            RenkoError::Io(_) => 1,
            RenkoError::ConfigParse { .. }
            | RenkoError::ConfigMissing { .. }
            | RenkoError::ConfigInvalid { .. } => 2,
            RenkoError::Data { .. } | RenkoError::NoData { .. } => 3,
            RenkoError::Alignment { .. } => 4,
            RenkoError::InvalidInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
