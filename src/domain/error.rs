//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("invalid date {value:?}: expected YYYY-MM-DD or ISO-8601 datetime")]
    InvalidDate { value: String },

    #[error("limit must be between 1 and {max}, got {value}")]
    InvalidLimit { value: i64, max: i64 },

    #[error("initial balance must be a non-negative number, got {value}")]
    InvalidBalance { value: f64 },

    #[error("unknown strategy type: {name}")]
    UnknownStrategy { name: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Database { .. } | TradesimError::DatabaseQuery { .. } => 3,
            TradesimError::InvalidSymbol { .. }
            | TradesimError::InvalidDate { .. }
            | TradesimError::InvalidLimit { .. }
            | TradesimError::InvalidBalance { .. }
            | TradesimError::UnknownStrategy { .. } => 4,
            TradesimError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
