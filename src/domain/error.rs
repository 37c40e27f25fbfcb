//! Domain error types.

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
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

    #[error("price source error: {reason}")]
    DataSource { reason: String },

    #[error("no price data for {symbol} in the requested date range")]
    DataUnavailable { symbol: String },

    #[error(
        "no evaluable rows for SMA({short})/SMA({long}) over {rows} price rows"
    )]
    NoEvaluableData {
        short: usize,
        long: usize,
        rows: usize,
    },

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Report { .. } => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. } => 2,
            SmacrossError::DataSource { .. } => 3,
            SmacrossError::InvalidParameter { .. } => 4,
            SmacrossError::DataUnavailable { .. } | SmacrossError::NoEvaluableData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
