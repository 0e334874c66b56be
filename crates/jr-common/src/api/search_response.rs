use serde::{Deserialize, Serialize};

use crate::{CandidateJob, JobType, SearchCriteria};

/// Job posting as the frontend expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub salary: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub remote: bool,
    pub posted: String,
    pub description: String,
    pub apply_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub jobs: Vec<JobPosting>,
    pub total: usize,
}

impl JobPosting {
    /// Build the display posting for one matched job.
    ///
    /// Display fields the provider left blank fall back to what the caller
    /// searched for, so the card never renders empty where the user supplied
    /// a value. The salary string is rebuilt from numeric bounds when the
    /// provider reported them.
    pub fn from_candidate(
        provider: &str,
        idx: usize,
        job: &CandidateJob,
        criteria: &SearchCriteria,
    ) -> Self {
        let title = if job.title.trim().is_empty() {
            criteria.title.clone()
        } else {
            job.title.clone()
        };

        let city = fallback(&job.city, criteria.location_city.as_deref());
        let state = fallback(&job.state, criteria.location_state.as_deref());
        let country = fallback(&job.country, criteria.country.as_deref());

        let location = {
            let parts: Vec<&str> = [city.as_str(), state.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect();
            if parts.is_empty() {
                job.location.clone()
            } else {
                parts.join(", ")
            }
        };

        let currency = job.salary_currency.as_deref().unwrap_or("USD");
        let salary = match (job.min_salary, job.max_salary) {
            (Some(min), Some(max)) => format!(
                "{currency} {} - {}",
                format_thousands(min),
                format_thousands(max)
            ),
            (Some(min), None) => format!("{currency} {}+", format_thousands(min)),
            _ => criteria.salary_range.clone().unwrap_or_default(),
        };

        let employment_type = job.employment_type.as_deref().unwrap_or("");
        let job_type = if employment_type.to_uppercase().contains("FULLTIME") {
            if job.remote {
                JobType::Remote
            } else {
                JobType::OnSite
            }
        } else if job.remote {
            JobType::Remote
        } else {
            criteria.effective_job_type()
        };
        let job_type = job_type.as_str().to_string();
        let remote = job_type == JobType::Remote.as_str();

        let posted = job
            .posted_at
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| criteria.date_posted.clone())
            .unwrap_or_default();

        let id = if job.apply_link.is_empty() {
            format!("{provider}_{idx}")
        } else {
            let prefix: String = job.apply_link.chars().take(20).collect();
            format!("{provider}_{idx}_{prefix}")
        };

        Self {
            id,
            title,
            company: job.company.clone(),
            location,
            city,
            state,
            country,
            salary,
            job_type,
            remote,
            posted,
            description: job.description.chars().take(500).collect(),
            apply_link: job.apply_link.clone(),
        }
    }
}

fn fallback(primary: &str, secondary: Option<&str>) -> String {
    let primary = primary.trim();
    if primary.is_empty() {
        secondary.unwrap_or("").to_string()
    } else {
        primary.to_string()
    }
}

fn format_thousands(value: f64) -> String {
    let whole = value.trunc() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if whole < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            title: "Software Engineer".into(),
            salary_range: Some("$80,000 - $100,000".into()),
            location_city: Some("Austin".into()),
            country: Some("US".into()),
            date_posted: Some("week".into()),
            ..Default::default()
        }
    }

    fn candidate() -> CandidateJob {
        CandidateJob {
            title: "Senior Software Engineer".into(),
            company: "Initech".into(),
            description: "Builds things.".into(),
            city: "Austin".into(),
            state: "TX".into(),
            country: "US".into(),
            apply_link: "https://example.com/jobs/1234567890".into(),
            ..Default::default()
        }
    }

    #[test]
    fn rebuilds_salary_from_numeric_bounds() {
        let mut job = candidate();
        job.min_salary = Some(85000.0);
        job.max_salary = Some(120000.0);
        job.salary_currency = Some("EUR".into());
        let posting = JobPosting::from_candidate("jsearch", 0, &job, &criteria());
        assert_eq!(posting.salary, "EUR 85,000 - 120,000");

        job.max_salary = None;
        let posting = JobPosting::from_candidate("jsearch", 0, &job, &criteria());
        assert_eq!(posting.salary, "EUR 85,000+");
    }

    #[test]
    fn missing_salary_falls_back_to_requested_range() {
        let posting = JobPosting::from_candidate("jsearch", 0, &candidate(), &criteria());
        assert_eq!(posting.salary, "$80,000 - $100,000");
    }

    #[test]
    fn id_embeds_provider_index_and_link_prefix() {
        let posting = JobPosting::from_candidate("theirstack", 3, &candidate(), &criteria());
        assert_eq!(posting.id, "theirstack_3_https://example.com/");

        let mut job = candidate();
        job.apply_link = String::new();
        let posting = JobPosting::from_candidate("theirstack", 3, &job, &criteria());
        assert_eq!(posting.id, "theirstack_3");
    }

    #[test]
    fn fulltime_postings_map_to_onsite_unless_remote() {
        let mut job = candidate();
        job.employment_type = Some("FULLTIME".into());
        job.remote = false;
        let posting = JobPosting::from_candidate("jsearch", 0, &job, &criteria());
        assert_eq!(posting.job_type, "On site");
        assert!(!posting.remote);

        job.remote = true;
        let posting = JobPosting::from_candidate("jsearch", 0, &job, &criteria());
        assert_eq!(posting.job_type, "Remote");
        assert!(posting.remote);
    }

    #[test]
    fn non_fulltime_non_remote_uses_requested_type() {
        let posting = JobPosting::from_candidate("jsearch", 0, &candidate(), &criteria());
        assert_eq!(posting.job_type, "Remote");
        assert!(posting.remote);
    }

    #[test]
    fn blank_display_fields_fall_back_to_criteria() {
        let mut job = candidate();
        job.title = String::new();
        job.city = String::new();
        job.state = String::new();
        job.country = String::new();
        job.posted_at = None;
        let posting = JobPosting::from_candidate("jsearch", 1, &job, &criteria());
        assert_eq!(posting.title, "Software Engineer");
        assert_eq!(posting.city, "Austin");
        assert_eq!(posting.state, "");
        assert_eq!(posting.country, "US");
        assert_eq!(posting.location, "Austin");
        assert_eq!(posting.posted, "week");
    }

    #[test]
    fn location_joins_city_and_state() {
        let posting = JobPosting::from_candidate("jsearch", 0, &candidate(), &criteria());
        assert_eq!(posting.location, "Austin, TX");
    }

    #[test]
    fn raw_location_used_when_no_structured_parts() {
        let mut job = candidate();
        job.city = String::new();
        job.state = String::new();
        job.location = "Greater Boston Area".into();
        let mut crit = criteria();
        crit.location_city = None;
        let posting = JobPosting::from_candidate("jsearch", 0, &job, &crit);
        assert_eq!(posting.location, "Greater Boston Area");
    }

    #[test]
    fn description_is_truncated() {
        let mut job = candidate();
        job.description = "x".repeat(620);
        let posting = JobPosting::from_candidate("jsearch", 0, &job, &criteria());
        assert_eq!(posting.description.chars().count(), 500);
    }

    #[test]
    fn serializes_frontend_field_names() {
        let posting = JobPosting::from_candidate("jsearch", 0, &candidate(), &criteria());
        let value = serde_json::to_value(&posting).unwrap();
        assert!(value.get("type").is_some());
        assert!(value.get("applyLink").is_some());
        assert!(value.get("job_type").is_none());
    }
}
