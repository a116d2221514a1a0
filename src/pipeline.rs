use crate::analysis::{
    join, rank, segment, status_overview, summarize, MarketSummary, PercentageColumn, Ranking,
    StatusOverview, MARKET_THRESHOLD, TOP_N,
};
use crate::config::Config;
use crate::data::{clean, incomplete_records, missing_profile, ColumnProfile, DataIngestion};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

/// Pipeline stage, attached to errors so a failure names where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Clean,
    Segment,
    Aggregate,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::Segment => "segment",
            Stage::Aggregate => "aggregate",
            Stage::Report => "report",
        };
        write!(f, "{} stage failed", name)
    }
}

/// Everything the run prints, computed up front.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub config: Config,
    pub generated_at: DateTime<Utc>,
    pub records: usize,
    pub status: StatusOverview,
    pub missing: Vec<ColumnProfile>,
    /// Records with at least one missing cell after cleaning.
    pub incomplete_records: usize,
    /// Distinct markets before the threshold filter.
    pub joined_markets: usize,
    pub summary: Vec<MarketSummary>,
    pub rankings: Vec<Ranking>,
}

/// Runs load, clean, segment and aggregate, then ranks each percentage
/// column.
///
/// Each stage takes the previous stage's output and returns a new frame;
/// nothing is shared between stages.
///
/// # Arguments
/// * `config` - Input path and encoding
///
/// # Returns
/// An `AnalysisReport` holding everything the binary prints
///
/// # Errors
/// Returns the first stage failure. The outermost context names the stage
/// (`"<stage> stage failed"`); the underlying `AnalysisError` is its source.
pub fn run(config: &Config) -> Result<AnalysisReport> {
    let raw = DataIngestion::new(config.encoding)
        .load_csv(&config.input_path)
        .context(Stage::Load)?;

    let cleaned = clean(&raw).context(Stage::Clean)?;
    let missing = missing_profile(&cleaned);
    let incomplete_records = incomplete_records(&cleaned);

    let status = status_overview(&cleaned).context(Stage::Segment)?;
    let segments = segment(&cleaned).context(Stage::Segment)?;

    let joined = join(&segments).context(Stage::Aggregate)?;
    let summary = summarize(&joined, MARKET_THRESHOLD).context(Stage::Aggregate)?;

    let rankings = PercentageColumn::ALL
        .iter()
        .map(|&column| rank(&summary, column, TOP_N))
        .collect();

    info!(
        records = raw.height(),
        markets = joined.market_count(),
        retained = summary.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        config: config.clone(),
        generated_at: Utc::now(),
        records: raw.height(),
        status,
        missing,
        incomplete_records,
        joined_markets: joined.market_count(),
        summary,
        rankings,
    })
}
