//! Domain error types.

/// Structural errors raised while building or combining aligned tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("column {column} has {actual} values, index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("{actual} value columns supplied for {expected} column names")]
    ColumnCount { expected: usize, actual: usize },

    #[error("index is not strictly increasing at position {position}")]
    UnsortedIndex { position: usize },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Top-level error type for weightbt.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("unrecognized instrument id {code} (expected six digits and .SH/.SZ, e.g. 510300.SH)")]
    UnknownInstrument { code: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        BacktestError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Csv(_) | BacktestError::DataSource { .. } => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::InvalidInput { .. }
            | BacktestError::UnknownInstrument { .. }
            | BacktestError::Frame(_) => 3,
            BacktestError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
