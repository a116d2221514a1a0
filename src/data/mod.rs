pub mod ingestion;
pub mod processing;

pub use ingestion::{DataIngestion, Encoding};
pub use processing::{clean, incomplete_records, missing_profile, ColumnProfile};
