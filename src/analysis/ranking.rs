use super::aggregation::MarketSummary;
use std::fmt;

/// Number of markets listed in each ranking.
pub const TOP_N: usize = 20;

/// Proportion columns of the market summary that can be ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentageColumn {
    Operating,
    Acquired,
    Closed,
}

impl PercentageColumn {
    /// Ranking order used in the report.
    pub const ALL: [PercentageColumn; 3] = [
        PercentageColumn::Operating,
        PercentageColumn::Acquired,
        PercentageColumn::Closed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PercentageColumn::Operating => "Operating_Perc",
            PercentageColumn::Acquired => "Acquired_Perc",
            PercentageColumn::Closed => "Closed_Perc",
        }
    }

    pub fn value(&self, summary: &MarketSummary) -> f64 {
        match self {
            PercentageColumn::Operating => summary.operating_perc,
            PercentageColumn::Acquired => summary.acquired_perc,
            PercentageColumn::Closed => summary.closed_perc,
        }
    }
}

/// The top markets for one percentage column, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub column: PercentageColumn,
    pub entries: Vec<(String, f64)>,
}

/// Sorts markets by `column` descending and keeps the first `top_n`.
///
/// The sort is stable, so markets with equal values keep summary order.
///
/// # Arguments
/// * `summary` - Markets that passed the threshold, in joined-table order
/// * `column` - Percentage column to rank by
/// * `top_n` - Maximum number of entries; fewer markets give a shorter ranking
///
/// # Returns
/// A `Ranking` with at most `top_n` `(market, value)` pairs, highest first
pub fn rank(summary: &[MarketSummary], column: PercentageColumn, top_n: usize) -> Ranking {
    let mut entries: Vec<(String, f64)> = summary
        .iter()
        .map(|s| (s.market.clone(), column.value(s)))
        .collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(top_n);

    Ranking { column, entries }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(market, _)| market.chars().count())
            .max()
            .unwrap_or(0)
            .max("market".len());

        writeln!(f, "{:<width$}  {}", "market", self.column.name())?;
        for (market, value) in &self.entries {
            writeln!(f, "{:<width$}  {:.2}", market, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(market: &str, operating_perc: f64, closed_perc: f64) -> MarketSummary {
        MarketSummary {
            market: market.to_string(),
            operating: 0,
            acquired: 0,
            closed: 0,
            total: 0,
            added: 0,
            missing: 0,
            missing_perc: 0.0,
            operating_perc,
            acquired_perc: 1.0 - operating_perc - closed_perc,
            closed_perc,
        }
    }

    #[test]
    fn test_rank_descending_with_stable_ties() {
        let rows = vec![
            summary("A", 0.5, 0.1),
            summary("B", 0.9, 0.05),
            summary("C", 0.5, 0.2),
        ];

        let ranking = rank(&rows, PercentageColumn::Operating, TOP_N);
        let markets: Vec<&str> = ranking.entries.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(markets, vec!["B", "A", "C"]);

        let closed = rank(&rows, PercentageColumn::Closed, TOP_N);
        assert_eq!(closed.entries[0], ("C".to_string(), 0.2));
    }

    #[test]
    fn test_rank_truncates_to_top_n() {
        let rows: Vec<MarketSummary> = (0..30)
            .map(|i| summary(&format!("m{i}"), i as f64 / 100.0, 0.0))
            .collect();

        let ranking = rank(&rows, PercentageColumn::Operating, TOP_N);
        assert_eq!(ranking.entries.len(), 20);
        assert!(ranking.entries.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(ranking.entries[0].0, "m29");
    }

    #[test]
    fn test_display_lists_column_header() {
        let ranking = rank(&[summary("Games", 1.0, 0.0)], PercentageColumn::Operating, 5);
        let text = ranking.to_string();
        assert!(text.starts_with("market  Operating_Perc\n"));
        assert!(text.contains("Games   1.00"));
    }
}
