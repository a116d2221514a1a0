use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::borrow::Cow;
use tracing::{debug, info};

pub const NAME_COLUMN: &str = "name";
pub const URL_COLUMN: &str = "homepage_url";
pub const MARKET_COLUMN: &str = "market";
pub const STATUS_COLUMN: &str = "status";
pub const FUNDING_COLUMN: &str = "funding_total_usd";

/// Token a missing funding value stringifies to.
pub const MISSING_FUNDING: &str = "nan";

/// Removes thousands separators from a funding value.
///
/// Missing values become [`MISSING_FUNDING`]. The result is always a string;
/// nothing downstream needs funding as a number. Applying it twice gives the
/// same result as applying it once.
pub fn normalize_funding(value: Option<&str>) -> String {
    match value {
        Some(v) => v.replace(',', ""),
        None => MISSING_FUNDING.to_string(),
    }
}

/// Fails with `MissingColumn` unless `frame` has a column called `name`.
pub fn require_column(frame: &DataFrame, name: &str) -> Result<()> {
    match frame.get_column_index(name) {
        Some(_) => Ok(()),
        None => Err(AnalysisError::MissingColumn(name.to_string())),
    }
}

/// Produces the analysis-ready frame.
///
/// Drops `name` and `homepage_url` and normalizes the funding column with
/// [`normalize_funding`]. All other columns pass through unchanged and the
/// input frame is left as it was.
///
/// # Arguments
/// * `frame` - Records as loaded by [`DataIngestion::load_csv`](super::DataIngestion::load_csv)
///
/// # Returns
/// A new `DataFrame` with the same rows and two fewer columns
///
/// # Errors
/// Returns `MissingColumn` if any of the three columns is absent
pub fn clean(frame: &DataFrame) -> Result<DataFrame> {
    for name in [NAME_COLUMN, URL_COLUMN, FUNDING_COLUMN] {
        require_column(frame, name)?;
    }

    let mut cleaned = frame.drop(NAME_COLUMN)?.drop(URL_COLUMN)?;
    let funding = cleaned
        .column(FUNDING_COLUMN)?
        .str()?
        .apply(|cell| Some(Cow::Owned(normalize_funding(cell))));
    cleaned.replace(FUNDING_COLUMN, funding.into_series())?;

    info!(
        rows = cleaned.height(),
        columns = cleaned.width(),
        "cleaned records"
    );

    Ok(cleaned)
}

/// Missing-cell count for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProfile {
    pub column: String,
    pub missing: usize,
}

/// Counts missing cells in every column, in header order.
pub fn missing_profile(frame: &DataFrame) -> Vec<ColumnProfile> {
    let profile: Vec<ColumnProfile> = frame
        .get_columns()
        .iter()
        .map(|column| ColumnProfile {
            column: column.name().to_string(),
            missing: column.null_count(),
        })
        .collect();

    debug!(?profile, "missing-value profile");
    profile
}

/// Number of records with at least one missing cell.
pub fn incomplete_records(frame: &DataFrame) -> usize {
    let mut incomplete = BooleanChunked::full("incomplete".into(), false, frame.height());
    for column in frame.get_columns() {
        incomplete = &incomplete | &column.is_null();
    }
    incomplete.num_trues()
}
