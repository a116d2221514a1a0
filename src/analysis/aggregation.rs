use super::segmentation::{Segments, Status, TOTAL_LABEL};
use crate::data::processing::MARKET_COLUMN;
use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use tracing::{debug, info};

/// Minimum number of start-ups a market must exceed to be summarised.
pub const MARKET_THRESHOLD: usize = 60;

/// One market after the outer join of the four frequency tables.
///
/// `None` means the market had no entry in that table, which is kept
/// distinct from a counted zero even though the arithmetic treats both alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub market: String,
    pub operating: Option<usize>,
    pub acquired: Option<usize>,
    pub closed: Option<usize>,
    pub total: Option<usize>,
}

/// Derived counts and proportions for a market above the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSummary {
    pub market: String,
    pub operating: usize,
    pub acquired: usize,
    pub closed: usize,
    pub total: usize,
    /// Operating + Acquired + Closed.
    pub added: usize,
    /// Total - Added: records whose status is none of the three.
    pub missing: usize,
    pub missing_perc: f64,
    pub operating_perc: f64,
    pub acquired_perc: f64,
    pub closed_perc: f64,
}

/// Rounds half to even at two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// The four frequency tables outer-joined on market name.
///
/// Columns are `market`, `Operating`, `Acquired`, `Closed` and `Total`. A
/// null cell means the market had no entry in that table.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    frame: DataFrame,
}

impl JoinedTable {
    /// Number of distinct markets.
    pub fn market_count(&self) -> usize {
        self.frame.height()
    }

    /// Reads the joined markets in table order, nulls as `None`.
    pub fn rows(&self) -> Result<Vec<JoinedRow>> {
        let markets = self.frame.column(MARKET_COLUMN)?.str()?;
        let [operating, acquired, closed] =
            Status::ALL.map(|status| counts(&self.frame, status.label()));
        let (operating, acquired, closed) = (operating?, acquired?, closed?);
        let total = counts(&self.frame, TOTAL_LABEL)?;

        Ok(markets
            .into_iter()
            .enumerate()
            .filter_map(|(i, market)| {
                Some(JoinedRow {
                    market: market?.to_string(),
                    operating: operating[i],
                    acquired: acquired[i],
                    closed: closed[i],
                    total: total[i],
                })
            })
            .collect())
    }
}

fn counts(frame: &DataFrame, label: &str) -> Result<Vec<Option<usize>>> {
    let column = frame.column(label)?.cast(&DataType::UInt64)?;
    Ok(column
        .u64()?
        .into_iter()
        .map(|count| count.map(|c| c as usize))
        .collect())
}

/// Outer-joins the four frequency tables on market name.
///
/// The join is a full join with the key columns coalesced, so every market
/// in any table gets exactly one row. Rows are ordered by descending total,
/// then market name.
///
/// # Arguments
/// * `segments` - The Operating, Acquired, Closed and Total tables
///
/// # Returns
/// A `JoinedTable` that keeps absent cells as nulls
///
/// # Errors
/// Returns `Frame` if polars fails to execute the join
pub fn join(segments: &Segments) -> Result<JoinedTable> {
    let on = [col(MARKET_COLUMN)];
    let args = JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns);

    let frame = segments
        .operating
        .frame()
        .clone()
        .lazy()
        .join(segments.acquired.frame().clone().lazy(), on.clone(), on.clone(), args.clone())
        .join(segments.closed.frame().clone().lazy(), on.clone(), on.clone(), args.clone())
        .join(segments.total.frame().clone().lazy(), on.clone(), on, args)
        .sort_by_exprs(
            [col(TOTAL_LABEL), col(MARKET_COLUMN)],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_nulls_last(true),
        )
        .collect()?;

    debug!(markets = frame.height(), "joined frequency tables");
    Ok(JoinedTable { frame })
}

fn ratio(count: usize, denominator: usize, market: &str, column: &'static str) -> Result<f64> {
    if denominator == 0 {
        return Err(AnalysisError::Arithmetic {
            market: market.to_string(),
            column,
        });
    }
    Ok(round2(count as f64 / denominator as f64))
}

/// Keeps markets with `total > threshold` and derives the summary columns.
///
/// Absent counts are filled with zero once the threshold is applied.
/// Percentages are rounded half to even at two decimals.
///
/// # Arguments
/// * `joined` - Output of [`join`]
/// * `threshold` - A market needs strictly more start-ups than this to be kept
///
/// # Returns
/// One `MarketSummary` per retained market, in joined-table order
///
/// # Errors
/// - `InconsistentCounts` if a market's status counts exceed its total
/// - `Arithmetic` if a retained market has no categorised records
/// - `EmptyResult` if no market passes the threshold
pub fn summarize(joined: &JoinedTable, threshold: usize) -> Result<Vec<MarketSummary>> {
    let retained = JoinedTable {
        frame: joined
            .frame
            .clone()
            .lazy()
            .filter(col(TOTAL_LABEL).gt(lit(threshold as u64)))
            .with_columns(
                Status::ALL.map(|status| col(status.label()).fill_null(lit(0u32))),
            )
            .collect()?,
    };

    let mut summary = Vec::new();
    for row in retained.rows()? {
        let total = row.total.unwrap_or(0);
        let operating = row.operating.unwrap_or(0);
        let acquired = row.acquired.unwrap_or(0);
        let closed = row.closed.unwrap_or(0);
        let added = operating + acquired + closed;

        if added > total {
            return Err(AnalysisError::InconsistentCounts {
                market: row.market,
                added,
                total,
            });
        }
        let missing = total - added;

        summary.push(MarketSummary {
            missing_perc: ratio(missing, total, &row.market, "Missing_Perc")?,
            operating_perc: ratio(operating, added, &row.market, "Operating_Perc")?,
            acquired_perc: ratio(acquired, added, &row.market, "Acquired_Perc")?,
            closed_perc: ratio(closed, added, &row.market, "Closed_Perc")?,
            market: row.market,
            operating,
            acquired,
            closed,
            total,
            added,
            missing,
        });
    }

    if summary.is_empty() {
        return Err(AnalysisError::EmptyResult { threshold });
    }

    info!(
        markets = joined.market_count(),
        retained = summary.len(),
        threshold,
        "summarised markets above threshold"
    );

    Ok(summary)
}
