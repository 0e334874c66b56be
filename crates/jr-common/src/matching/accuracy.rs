use chrono::{DateTime, Utc};

use super::scoring::{MatchEngine, MatchReport};
use crate::{CandidateJob, SearchCriteria};

/// How often one field's matcher returned true across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAccuracy {
    pub field: &'static str,
    pub matched: usize,
    pub applicable: usize,
}

impl FieldAccuracy {
    /// Share of applicable checks that matched. A field the criteria never
    /// exercised reports 100.0, mirroring the vacuous-match policy.
    pub fn percent(&self) -> f64 {
        if self.applicable == 0 {
            100.0
        } else {
            self.matched as f64 / self.applicable as f64 * 100.0
        }
    }
}

/// Per-field and overall accuracy statistics for one scored batch.
///
/// This is a reporting view over the shared scorer; it introduces no
/// matching logic of its own.
#[derive(Debug, Clone, Default)]
pub struct AccuracyReport {
    pub fields: Vec<FieldAccuracy>,
    pub reports: Vec<MatchReport>,
    pub perfect_matches: usize,
    pub strong_matches: usize,
    /// Score bound the strong-match count was taken at.
    pub strong_threshold: f64,
}

impl AccuracyReport {
    /// Mean of the per-job scores. An empty batch reports 0.0.
    pub fn overall(&self) -> f64 {
        if self.reports.is_empty() {
            return 0.0;
        }
        let total: f64 = self.reports.iter().map(|r| r.score).sum();
        total / self.reports.len() as f64
    }

    pub fn job_count(&self) -> usize {
        self.reports.len()
    }
}

/// Score every candidate in `jobs` and tabulate per-field hit rates,
/// perfect-match counts, and strong matches (score at or above the engine's
/// operating threshold).
pub fn evaluate_batch(
    engine: &MatchEngine,
    criteria: &SearchCriteria,
    jobs: &[CandidateJob],
    now: DateTime<Utc>,
) -> AccuracyReport {
    let reports: Vec<MatchReport> = jobs.iter().map(|job| engine.score(criteria, job, now)).collect();

    let mut tallies = [(0usize, 0usize); 7];
    for report in &reports {
        for (idx, (_, check)) in report.checks().into_iter().enumerate() {
            if check.is_applicable() {
                tallies[idx].1 += 1;
                if check.is_match() {
                    tallies[idx].0 += 1;
                }
            }
        }
    }

    let names = MatchReport::default().checks().map(|(name, _)| name);
    let fields = names
        .into_iter()
        .zip(tallies)
        .map(|(field, (matched, applicable))| FieldAccuracy { field, matched, applicable })
        .collect();

    let strong_threshold = engine.config().min_score_threshold.min(100.0);
    let perfect_matches = reports.iter().filter(|r| r.is_perfect()).count();
    let strong_matches = reports.iter().filter(|r| r.score >= strong_threshold).count();

    AccuracyReport { fields, reports, perfect_matches, strong_matches, strong_threshold }
}
