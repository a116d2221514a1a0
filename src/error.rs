use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the analysis stages.
///
/// Every variant is fatal for a run: there is no partial-result mode, so the
/// orchestration layer attaches the failing stage name and aborts.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot read '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not valid {encoding} (invalid byte sequence at offset {offset})", path.display())]
    Decoding {
        path: PathBuf,
        encoding: &'static str,
        offset: usize,
    },

    #[error("malformed CSV in '{}': {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("data frame operation failed: {0}")]
    Frame(#[from] PolarsError),

    #[error("required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("division by zero computing {column} for market '{market}'")]
    Arithmetic { market: String, column: &'static str },

    #[error("market '{market}' has {added} categorised start-ups but only {total} in total")]
    InconsistentCounts {
        market: String,
        added: usize,
        total: usize,
    },

    #[error("no market has more than {threshold} start-ups, nothing to rank")]
    EmptyResult { threshold: usize },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
