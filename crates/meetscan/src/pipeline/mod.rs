//! Incremental ingestion: list, dedup, classify, fetch, extract, persist.

pub mod error;
pub mod outcome;
pub mod runner;

pub use error::PipelineError;
pub use outcome::{CycleReport, CycleSummary, MessageOutcome, SkipReason};
pub use runner::IngestPipeline;
