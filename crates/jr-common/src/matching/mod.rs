pub mod accuracy;
pub mod filter;
pub mod rules;
pub mod scoring;

pub use accuracy::{evaluate_batch, AccuracyReport, FieldAccuracy};
pub use filter::filter_jobs;
pub use scoring::{FieldCheck, MatchConfig, MatchEngine, MatchReport};
