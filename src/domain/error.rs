//! Domain error types.

/// Top-level error type for meanrev.
#[derive(Debug, thiserror::Error)]
pub enum MeanrevError {
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

    #[error("unknown timezone: {name}")]
    Timezone { name: String },

    #[error("bad timestamp {value}: {reason}")]
    Timestamp { value: String, reason: String },

    #[error("bad bar data at {timestamp}: {reason}")]
    DataQuality { timestamp: String, reason: String },

    #[error("bar feed error: {reason}")]
    Feed { reason: String },

    #[error("no bars for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MeanrevError> for std::process::ExitCode {
    fn from(err: &MeanrevError) -> Self {
        let code: u8 = match err {
            MeanrevError::Io(_) => 1,
            MeanrevError::ConfigParse { .. }
            | MeanrevError::ConfigMissing { .. }
            | MeanrevError::ConfigInvalid { .. }
            | MeanrevError::Timezone { .. } => 2,
            MeanrevError::Timestamp { .. } | MeanrevError::DataQuality { .. } => 3,
            MeanrevError::Feed { .. } => 4,
            MeanrevError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
