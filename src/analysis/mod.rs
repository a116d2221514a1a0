pub mod aggregation;
pub mod ranking;
pub mod segmentation;

pub use aggregation::{join, summarize, MarketSummary, MARKET_THRESHOLD};
pub use ranking::{rank, PercentageColumn, Ranking, TOP_N};
pub use segmentation::{segment, status_overview, StatusOverview};
