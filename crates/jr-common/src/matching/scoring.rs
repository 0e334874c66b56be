use chrono::{DateTime, Utc};

use super::rules;
use crate::{CandidateJob, JobType, SearchCriteria};

/// Operating knobs for the matching pipeline. Values come from the
/// environment once at startup; nothing here is read per call.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Minimum match score a candidate needs to survive filtering.
    pub min_score_threshold: f64,
    /// Maximum number of postings returned per search.
    pub result_limit: usize,
    /// Provider pages fetched per search.
    pub search_pages: u32,
    /// Read-side TTL for cached provider responses.
    pub cache_ttl_minutes: i64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_score_threshold: 80.0,
            result_limit: 15,
            search_pages: 2,
            cache_ttl_minutes: 60,
        }
    }
}

impl MatchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_score_threshold: env_parsed("JR_MIN_SCORE_THRESHOLD", defaults.min_score_threshold),
            result_limit: env_parsed("JR_RESULT_LIMIT", defaults.result_limit),
            search_pages: env_parsed("JR_SEARCH_PAGES", defaults.search_pages),
            cache_ttl_minutes: env_parsed("JR_CACHE_TTL_MINUTES", defaults.cache_ttl_minutes),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Outcome of one field matcher. `None` means the criterion was absent and
/// the field did not participate in scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldCheck {
    pub outcome: Option<bool>,
}

impl FieldCheck {
    pub fn skipped() -> Self {
        Self { outcome: None }
    }

    pub fn checked(matched: bool) -> Self {
        Self { outcome: Some(matched) }
    }

    pub fn is_applicable(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn is_match(&self) -> bool {
        self.outcome == Some(true)
    }
}

/// Per-field outcomes and the aggregate score for one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    /// 100 * matched / applicable; 100.0 when nothing was applicable.
    pub score: f64,
    pub title: FieldCheck,
    pub industry: FieldCheck,
    pub salary: FieldCheck,
    pub job_type: FieldCheck,
    pub location: FieldCheck,
    pub country: FieldCheck,
    pub date_posted: FieldCheck,
}

impl MatchReport {
    /// Field outcomes in report order.
    pub fn checks(&self) -> [(&'static str, FieldCheck); 7] {
        [
            ("title", self.title),
            ("industry", self.industry),
            ("salary", self.salary),
            ("job_type", self.job_type),
            ("location", self.location),
            ("country", self.country),
            ("date_posted", self.date_posted),
        ]
    }

    pub fn applicable(&self) -> usize {
        self.checks().iter().filter(|(_, c)| c.is_applicable()).count()
    }

    pub fn matched(&self) -> usize {
        self.checks().iter().filter(|(_, c)| c.is_match()).count()
    }

    pub fn is_perfect(&self) -> bool {
        self.score >= 100.0
    }
}

/// Scores candidates against search criteria.
///
/// Pure and deterministic: the evaluation instant is an explicit parameter,
/// so identical inputs always produce identical reports.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Run every applicable field matcher and fold the outcomes into a
    /// 0-100 score. A criteria set with nothing to check scores 100.0.
    pub fn score(
        &self,
        criteria: &SearchCriteria,
        job: &CandidateJob,
        now: DateTime<Utc>,
    ) -> MatchReport {
        let mut report = MatchReport {
            title: FieldCheck::checked(rules::title_matches(&criteria.title, &job.title)),
            ..MatchReport::default()
        };

        if let Some(industry) = non_empty(&criteria.industry) {
            report.industry = FieldCheck::checked(rules::industry_matches(industry, job));
        }

        if let Some(range) = non_empty(&criteria.salary_range) {
            report.salary = FieldCheck::checked(rules::salary_matches(range, job));
        }

        if let Some(job_type) = criteria.job_type {
            report.job_type = FieldCheck::checked(rules::job_type_matches(job_type, job));
        }

        let city = non_empty(&criteria.location_city);
        let state = non_empty(&criteria.location_state);
        if city.is_some() || state.is_some() {
            if criteria.effective_job_type() == JobType::Remote {
                // Remote searches can be filled from anywhere.
                report.location = FieldCheck::checked(true);
            } else {
                report.location = FieldCheck::checked(rules::location_matches(city, state, job));
            }
        }

        if let Some(country) = non_empty(&criteria.country) {
            report.country = FieldCheck::checked(rules::country_matches(country, &job.country));
        }

        if let Some(window) = non_empty(&criteria.date_posted) {
            report.date_posted = FieldCheck::checked(rules::date_matches(window, job, now));
        }

        let applicable = report.applicable();
        report.score = if applicable == 0 {
            100.0
        } else {
            report.matched() as f64 / applicable as f64 * 100.0
        };
        report
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn remote_criteria() -> SearchCriteria {
        SearchCriteria {
            title: "Software Engineer".into(),
            job_type: Some(JobType::Remote),
            salary_range: Some("$80,000 - $100,000".into()),
            country: Some("US".into()),
            ..SearchCriteria::default()
        }
    }

    fn remote_candidate() -> CandidateJob {
        CandidateJob {
            title: "Senior Software Engineer".into(),
            remote: true,
            min_salary: Some(85_000.0),
            max_salary: Some(95_000.0),
            country: "United States".into(),
            ..CandidateJob::default()
        }
    }

    #[test]
    fn full_match_scores_one_hundred() {
        let engine = MatchEngine::default();
        let report = engine.score(&remote_criteria(), &remote_candidate(), base_now());

        assert_eq!(report.applicable(), 4);
        assert_eq!(report.matched(), 4);
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn salary_mismatch_scores_three_of_four() {
        let engine = MatchEngine::default();
        let candidate = CandidateJob {
            min_salary: Some(150_000.0),
            max_salary: Some(160_000.0),
            ..remote_candidate()
        };

        let report = engine.score(&remote_criteria(), &candidate, base_now());

        assert_eq!(report.salary, FieldCheck::checked(false));
        assert_eq!(report.score, 75.0);
    }

    #[test]
    fn title_only_criteria_scores_vacuously() {
        let engine = MatchEngine::default();
        let criteria = SearchCriteria {
            title: "Software Engineer".into(),
            ..SearchCriteria::default()
        };

        let report = engine.score(&criteria, &remote_candidate(), base_now());

        assert_eq!(report.applicable(), 1);
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn absent_criteria_are_not_scored() {
        let engine = MatchEngine::default();
        let criteria = SearchCriteria {
            title: "Software Engineer".into(),
            industry: Some("  ".into()),
            ..SearchCriteria::default()
        };

        let report = engine.score(&criteria, &remote_candidate(), base_now());

        assert_eq!(report.industry, FieldCheck::skipped());
        assert_eq!(report.job_type, FieldCheck::skipped());
        assert_eq!(report.location, FieldCheck::skipped());
    }

    #[test]
    fn remote_criterion_bypasses_location() {
        let engine = MatchEngine::default();
        let criteria = SearchCriteria {
            location_city: Some("San Francisco".into()),
            location_state: Some("CA".into()),
            ..remote_criteria()
        };
        let candidate = CandidateJob {
            city: "Austin".into(),
            state: "TX".into(),
            ..remote_candidate()
        };

        let report = engine.score(&criteria, &candidate, base_now());

        assert_eq!(report.location, FieldCheck::checked(true));
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn onsite_criterion_enforces_location() {
        let engine = MatchEngine::default();
        let criteria = SearchCriteria {
            title: "Software Engineer".into(),
            job_type: Some(JobType::OnSite),
            location_city: Some("San Francisco".into()),
            ..SearchCriteria::default()
        };
        let candidate = CandidateJob {
            title: "Software Engineer".into(),
            remote: false,
            city: "Austin".into(),
            ..CandidateJob::default()
        };

        let report = engine.score(&criteria, &candidate, base_now());

        assert_eq!(report.location, FieldCheck::checked(false));
        assert_eq!(report.applicable(), 3);
        assert!((report.score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_deterministic() {
        let engine = MatchEngine::default();
        let criteria = remote_criteria();
        let candidate = remote_candidate();

        let first = engine.score(&criteria, &candidate, base_now());
        let second = engine.score(&criteria, &candidate, base_now());

        assert_eq!(first, second);
    }

    #[test]
    fn unparseable_posting_date_counts_as_match() {
        let engine = MatchEngine::default();
        let criteria = SearchCriteria {
            date_posted: Some("week".into()),
            ..remote_criteria()
        };
        let candidate = CandidateJob {
            posted_at: Some("Full Time".into()),
            ..remote_candidate()
        };

        let report = engine.score(&criteria, &candidate, base_now());

        assert_eq!(report.date_posted, FieldCheck::checked(true));
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn config_defaults_match_operating_policy() {
        let defaults = MatchConfig::default();
        assert_eq!(defaults.min_score_threshold, 80.0);
        assert_eq!(defaults.result_limit, 15);
        assert_eq!(defaults.search_pages, 2);
        assert_eq!(defaults.cache_ttl_minutes, 60);
    }
}
