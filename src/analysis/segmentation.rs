use crate::data::processing::{require_column, MARKET_COLUMN, STATUS_COLUMN};
use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Column holding the count in a [`FrequencyTable`] built over the whole data set.
pub const TOTAL_LABEL: &str = "Total";

/// Recorded business state of a start-up.
///
/// Only the three lowercase values in the data set are recognised. Matching
/// is exact, so `Operating` or a missing status belongs to no subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Operating,
    Acquired,
    Closed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Operating, Status::Acquired, Status::Closed];

    /// Cell value that marks a record with this status.
    pub fn value(&self) -> &'static str {
        match self {
            Status::Operating => "operating",
            Status::Acquired => "acquired",
            Status::Closed => "closed",
        }
    }

    /// Name of the count column for this status in the joined market table.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Operating => "Operating",
            Status::Acquired => "Acquired",
            Status::Closed => "Closed",
        }
    }
}

/// Count of records per distinct key, ordered by descending count.
///
/// Backed by a two-column frame (`key`, `label`) so it can be joined with
/// other tables; the entries are also read out once for lookups and printing.
/// Keys that never occur have no row. Equal counts are ordered by key so the
/// table is deterministic.
///
/// # Fields
/// * `frame`: The grouped frame, key column first and count column second
/// * `entries`: The same rows as `(key, count)` pairs
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    frame: DataFrame,
    entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    /// Counts the non-null values of one column.
    ///
    /// # Arguments
    /// * `frame` - Records to count
    /// * `key` - Column whose distinct values are counted
    /// * `label` - Name given to the count column
    ///
    /// # Returns
    /// A `FrequencyTable` sorted by descending count, then key
    ///
    /// # Errors
    /// Returns `MissingColumn` if `key` is not a column of `frame`
    pub fn count(frame: &DataFrame, key: &str, label: &str) -> Result<Self> {
        require_column(frame, key)?;

        let counted = frame
            .clone()
            .lazy()
            .filter(col(key).is_not_null())
            .group_by([col(key)])
            .agg([len().alias(label)])
            .sort_by_exprs(
                [col(label), col(key)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()?;

        let keys = counted.column(key)?.str()?;
        let counts = counted.column(label)?.cast(&DataType::UInt64)?;
        let entries = keys
            .into_iter()
            .zip(counts.u64()?)
            .filter_map(|(key, count)| Some((key?.to_string(), count? as usize)))
            .collect();

        Ok(Self {
            frame: counted,
            entries,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

/// Per-market frequency tables for each status subset and the full data set.
#[derive(Debug, Clone)]
pub struct Segments {
    pub operating: FrequencyTable,
    pub acquired: FrequencyTable,
    pub closed: FrequencyTable,
    pub total: FrequencyTable,
}

/// Distribution of the status column over the whole data set.
#[derive(Debug, Clone)]
pub struct StatusOverview {
    pub counts: FrequencyTable,
    pub missing: usize,
}

/// Rows of `frame` whose status is exactly `status`, with every column kept.
///
/// # Errors
/// Returns `MissingColumn` if the frame has no status column
pub fn subset(frame: &DataFrame, status: Status) -> Result<DataFrame> {
    require_column(frame, STATUS_COLUMN)?;
    Ok(frame
        .clone()
        .lazy()
        .filter(col(STATUS_COLUMN).eq(lit(status.value())))
        .collect()?)
}

/// Frequency of each market value in `frame`. Missing markets are skipped.
pub fn market_counts(frame: &DataFrame, label: &str) -> Result<FrequencyTable> {
    FrequencyTable::count(frame, MARKET_COLUMN, label)
}

/// Partitions the records by status and counts markets in each subset and
/// in the full data set.
///
/// The three subsets are disjoint. Records whose status is missing or
/// unrecognised only contribute to the `Total` table.
///
/// # Arguments
/// * `frame` - Cleaned records with `market` and `status` columns
///
/// # Returns
/// `Segments` holding the Operating, Acquired, Closed and Total tables
///
/// # Errors
/// Returns `MissingColumn` if either column is absent
pub fn segment(frame: &DataFrame) -> Result<Segments> {
    let [operating, acquired, closed] = Status::ALL.map(|status| {
        subset(frame, status).and_then(|rows| market_counts(&rows, status.label()))
    });
    let (operating, acquired, closed) = (operating?, acquired?, closed?);
    let total = market_counts(frame, TOTAL_LABEL)?;
    if total.is_empty() {
        warn!("no record carries a market value");
    }

    info!(
        operating = operating.total(),
        acquired = acquired.total(),
        closed = closed.total(),
        markets = total.len(),
        "segmented records by status"
    );
    debug!(
        operating_markets = operating.len(),
        acquired_markets = acquired.len(),
        closed_markets = closed.len(),
        "distinct markets per subset"
    );

    Ok(Segments {
        operating,
        acquired,
        closed,
        total,
    })
}

pub fn status_overview(frame: &DataFrame) -> Result<StatusOverview> {
    let counts = FrequencyTable::count(frame, STATUS_COLUMN, "count")?;
    let missing = frame.column(STATUS_COLUMN)?.null_count();
    Ok(StatusOverview { counts, missing })
}
