use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::normalize::{alias_bucket, parse_posted_date, parse_salary_range, DateWindow};
use crate::{CandidateJob, JobType};

/// Minimum share of criterion keywords that must appear in the candidate
/// title for a keyword-based title match.
const TITLE_KEYWORD_RATIO: f64 = 0.5;

/// Title check. Keywords are the criterion tokens longer than three
/// characters; the candidate matches when at least half of them appear
/// verbatim among its own tokens. When no token survives the length filter
/// (short titles like "PM"), fall back to full-string containment in either
/// direction.
pub fn title_matches(criterion: &str, candidate: &str) -> bool {
    let crit = criterion.to_lowercase();
    let cand = candidate.to_lowercase();

    let crit_tokens: HashSet<&str> = crit.split_whitespace().collect();
    let cand_tokens: HashSet<&str> = cand.split_whitespace().collect();

    let keywords: Vec<&str> = crit_tokens
        .iter()
        .copied()
        .filter(|w| w.chars().count() > 3)
        .collect();

    if keywords.is_empty() {
        return crit.contains(&cand) || cand.contains(&crit);
    }

    let hits = keywords.iter().filter(|kw| cand_tokens.contains(**kw)).count();
    hits as f64 >= keywords.len() as f64 * TITLE_KEYWORD_RATIO
}

/// Work-arrangement check against the candidate's remote flag. Hybrid has
/// no flag of its own upstream, so it is detected from the posting text.
pub fn job_type_matches(criterion: JobType, job: &CandidateJob) -> bool {
    match criterion {
        JobType::Remote => job.remote,
        JobType::OnSite => !job.remote,
        JobType::Hybrid => {
            let title = job.title.to_lowercase();
            let description = job.description.to_lowercase();
            title.contains("hybrid") || description.contains("hybrid")
        }
    }
}

/// Location check: exact case-insensitive equality per present sub-field.
/// When both city and state are given, both must match. Substring matching
/// is deliberately not used here so nearby cities do not blur together.
pub fn location_matches(
    criterion_city: Option<&str>,
    criterion_state: Option<&str>,
    job: &CandidateJob,
) -> bool {
    let job_city = job.city.to_lowercase();
    let job_state = job.state.to_lowercase();

    let city_ok = criterion_city.map_or(true, |c| c.to_lowercase() == job_city);
    let state_ok = criterion_state.map_or(true, |s| s.to_lowercase() == job_state);
    city_ok && state_ok
}

/// Country check. A criterion naming an alias bucket (us/uk/ca) matches
/// when the candidate country contains any variant; otherwise bidirectional
/// substring containment.
pub fn country_matches(criterion: &str, candidate_country: &str) -> bool {
    let crit = criterion.trim().to_lowercase();
    let cand = candidate_country.trim().to_lowercase();

    if let Some(aliases) = alias_bucket(&crit) {
        return aliases.iter().any(|alias| cand.contains(alias));
    }
    crit.contains(&cand) || cand.contains(&crit)
}

/// Salary check: numeric ranges must overlap. When either side cannot be
/// parsed, or the candidate lacks a numeric min and max, the field cannot
/// be verified and counts as a match.
pub fn salary_matches(criterion_range: &str, job: &CandidateJob) -> bool {
    let Some((crit_min, crit_max)) = parse_salary_range(criterion_range) else {
        debug!(range = criterion_range, "criterion salary unparseable, counting as match");
        return true;
    };
    let (Some(job_min), Some(job_max)) = (job.min_salary, job.max_salary) else {
        return true;
    };
    !(job_max < crit_min || job_min > crit_max)
}

/// Date-posted check: the candidate's posting date must fall inside the
/// window the criterion names. An absent or unparseable posting date counts
/// as a match.
pub fn date_matches(criterion: &str, job: &CandidateJob, now: DateTime<Utc>) -> bool {
    let Some(max_age) = DateWindow::from_criterion(criterion).max_age_days() else {
        return true;
    };
    let Some(raw) = job.posted_at.as_deref() else {
        return true;
    };
    let Some(posted) = parse_posted_date(raw, now) else {
        debug!(posted_at = raw, "posting date unparseable, counting as match");
        return true;
    };
    (now.date_naive() - posted).num_days() <= max_age
}

/// Industry check. Candidate records carry no industry field, so the
/// criterion is checked against the posting text itself; empty text cannot
/// be verified and counts as a match.
pub fn industry_matches(criterion: &str, job: &CandidateJob) -> bool {
    let crit = criterion.trim().to_lowercase();
    let text = format!("{} {}", job.title, job.description).trim().to_lowercase();
    text.contains(&crit) || crit.contains(&text)
}
