use chrono::{DateTime, Utc};
use tracing::debug;

use super::scoring::{MatchEngine, MatchReport};
use crate::{CandidateJob, SearchCriteria};

/// Score a batch and keep the candidates at or above `min_threshold`.
///
/// Provider ordering is preserved among survivors; ranking by score is the
/// caller's business. Thresholds above 100 clamp to 100 so an exact-match
/// requirement stays expressible, and 0 disables filtering.
pub fn filter_jobs(
    engine: &MatchEngine,
    criteria: &SearchCriteria,
    jobs: Vec<CandidateJob>,
    min_threshold: f64,
    now: DateTime<Utc>,
) -> Vec<(CandidateJob, MatchReport)> {
    let threshold = min_threshold.min(100.0);
    let total = jobs.len();

    let survivors: Vec<(CandidateJob, MatchReport)> = jobs
        .into_iter()
        .map(|job| {
            let report = engine.score(criteria, &job, now);
            (job, report)
        })
        .filter(|(_, report)| report.score >= threshold)
        .collect();

    debug!(total, kept = survivors.len(), threshold, "filtered candidate batch");
    survivors
}
