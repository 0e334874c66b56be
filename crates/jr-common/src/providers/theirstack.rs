use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{bool_field, decode_body, num_field, opt_str_field, str_field, JobProvider, ProviderError};
use crate::normalize::{country_code, parse_salary_range, recover_state_code, split_location, DateWindow};
use crate::{CandidateJob, JobType, SearchCriteria};

const SEARCH_URL: &str = "https://api.theirstack.com/v1/jobs/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_LIMIT: u32 = 15;

/// TheirStack client. POST with a Bearer token; pages are 0-based.
pub struct TheirStackProvider {
    client: Client,
    api_key: String,
}

impl TheirStackProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    async fn fetch_page(&self, body: &SearchBody) -> Result<Vec<Value>, ProviderError> {
        let response = self
            .client
            .post(SEARCH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                provider: "theirstack",
                status: status.as_u16(),
            });
        }

        let parsed = decode_body("theirstack", &response.text().await?)?;
        Ok(unwrap_jobs(&parsed))
    }
}

#[async_trait]
impl JobProvider for TheirStackProvider {
    fn name(&self) -> &'static str {
        "theirstack"
    }

    #[instrument(skip(self, criteria), fields(provider = "theirstack"))]
    async fn fetch(
        &self,
        criteria: &SearchCriteria,
        pages: u32,
    ) -> Result<Vec<CandidateJob>, ProviderError> {
        let mut raw_jobs = Vec::new();

        for page in 0..pages {
            let body = SearchBody::from_criteria(criteria, page);
            let page_jobs = self.fetch_page(&body).await?;
            info!(page, jobs_on_page = page_jobs.len(), "fetched search page");
            if page_jobs.is_empty() {
                // No point paging past an empty result set.
                break;
            }
            raw_jobs.extend(page_jobs);
        }

        // Overly narrow filters often return nothing at all. Retry once with
        // only the title, country, and age kept; the relevance filter decides
        // what survives downstream.
        if raw_jobs.is_empty() {
            let primary = SearchBody::from_criteria(criteria, 0);
            if primary.has_narrowing_filters() {
                info!("no results with filters, retrying with fewer restrictions");
                raw_jobs = self.fetch_page(&primary.stripped()).await?;
            }
        }

        Ok(raw_jobs.iter().map(map_job).collect())
    }
}

#[derive(Debug, Clone, Serialize)]
struct SearchBody {
    page: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_title_or: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_country_code_or: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_location_pattern_or: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    posted_at_max_age_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_salary_usd: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_salary_usd: Option<i64>,
}

impl SearchBody {
    fn from_criteria(criteria: &SearchCriteria, page: u32) -> Self {
        let job_type = criteria.effective_job_type();

        let job_country_code_or = criteria
            .country
            .as_deref()
            .and_then(country_code)
            .map(|code| vec![code]);

        // A city pattern on a remote search would exclude the very postings
        // the caller wants.
        let job_location_pattern_or = criteria
            .location_city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty() && job_type != JobType::Remote)
            .map(|city| vec![city.to_string()]);

        let remote = match job_type {
            JobType::Remote => Some(true),
            JobType::OnSite => Some(false),
            JobType::Hybrid => None,
        };

        let posted_at_max_age_days = criteria
            .date_posted
            .as_deref()
            .map(DateWindow::from_criterion)
            .and_then(|window| window.max_age_days());

        // Salary bounds go upstream only for a genuine two-ended range; a
        // single bound is too restrictive a filter for this engine.
        let (min_salary_usd, max_salary_usd) = criteria
            .salary_range
            .as_deref()
            .and_then(parse_salary_range)
            .filter(|(min, max)| min < max)
            .map(|(min, max)| (Some(min as i64), Some(max as i64)))
            .unwrap_or((None, None));

        Self {
            page,
            limit: PAGE_LIMIT,
            job_title_or: Some(vec![criteria.title.clone()]),
            job_country_code_or,
            job_location_pattern_or,
            remote,
            posted_at_max_age_days,
            min_salary_usd,
            max_salary_usd,
        }
    }

    fn has_narrowing_filters(&self) -> bool {
        self.job_location_pattern_or.is_some()
            || self.remote.is_some()
            || self.min_salary_usd.is_some()
            || self.max_salary_usd.is_some()
    }

    /// The fallback body: title, country, and age kept, the rest dropped.
    fn stripped(&self) -> Self {
        Self {
            page: 0,
            limit: self.limit,
            job_title_or: self.job_title_or.clone(),
            job_country_code_or: self.job_country_code_or.clone(),
            job_location_pattern_or: None,
            remote: None,
            posted_at_max_age_days: self.posted_at_max_age_days,
            min_salary_usd: None,
            max_salary_usd: None,
        }
    }
}

/// Pull the job list out of whichever envelope the response used.
fn unwrap_jobs(body: &Value) -> Vec<Value> {
    if let Some(list) = body.as_array() {
        return list.clone();
    }

    if let Some(metadata) = body.get("metadata") {
        debug!(total = ?metadata.get("total"), "search metadata");
    }

    if let Some(data) = body.get("data") {
        if let Some(list) = data.as_array() {
            return list.clone();
        }
        // Some responses nest the list one level deeper.
        for key in ["items", "jobs"] {
            if let Some(list) = data.get(key).and_then(Value::as_array) {
                return list.clone();
            }
        }
        warn!("data field had an unexpected shape");
        return Vec::new();
    }

    for key in ["jobs", "results", "items"] {
        if let Some(list) = body.get(key).and_then(Value::as_array) {
            return list.clone();
        }
    }

    warn!("unrecognized response shape");
    Vec::new()
}

fn map_job(job: &Value) -> CandidateJob {
    let location = str_field(job, &["location", "job_location", "short_location"]);
    let parsed = split_location(&location);

    let city = opt_str_field(job, &["city", "job_city"])
        .or(parsed.city)
        .unwrap_or_default();
    let state = opt_str_field(job, &["state", "job_state", "state_code"])
        .or_else(|| parsed.state.clone().filter(|s| s.len() == 2))
        .or_else(|| recover_state_code(&location))
        .unwrap_or_default();
    let country = opt_str_field(job, &["country", "job_country", "country_code"])
        .or(parsed.country)
        .unwrap_or_default();

    CandidateJob {
        provider_id: str_field(job, &["job_id", "id"]),
        title: str_field(job, &["title", "job_title"]),
        company: company_name(job),
        description: str_field(job, &["description", "job_description"]),
        location,
        city,
        state,
        country,
        min_salary: num_field(job, &["min_annual_salary_usd", "min_annual_salary"]),
        max_salary: num_field(job, &["max_annual_salary_usd", "max_annual_salary"]),
        salary_currency: opt_str_field(job, &["salary_currency"]),
        employment_type: employment_type(job),
        remote: bool_field(job, &["remote", "has_remote", "is_remote"]),
        posted_at: opt_str_field(job, &["date_posted", "posted_at"]),
        apply_link: str_field(job, &["url", "final_url", "apply_link", "link"]),
    }
}

fn company_name(job: &Value) -> String {
    if let Some(name) = opt_str_field(job, &["company_name", "employer_name"]) {
        return name;
    }
    // Newer responses nest the company as an object.
    for key in ["company", "company_object"] {
        match job.get(key) {
            Some(Value::String(name)) if !name.trim().is_empty() => return name.clone(),
            Some(Value::Object(company)) => {
                if let Some(Value::String(name)) = company.get("name") {
                    return name.clone();
                }
            }
            _ => {}
        }
    }
    String::new()
}

fn employment_type(job: &Value) -> Option<String> {
    if let Some(kind) = opt_str_field(job, &["employment_type", "employment_status"]) {
        return Some(kind);
    }
    let statuses = job.get("employment_statuses")?.as_array()?;
    let joined = statuses
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            title: "Software Engineer".into(),
            salary_range: Some("$80,000 - $100,000".into()),
            job_type: Some(JobType::Remote),
            location_city: Some("San Francisco".into()),
            country: Some("US".into()),
            date_posted: Some("week".into()),
            ..Default::default()
        }
    }

    #[test]
    fn body_carries_title_country_and_window() {
        let body = SearchBody::from_criteria(&criteria(), 0);
        assert_eq!(body.page, 0);
        assert_eq!(body.limit, PAGE_LIMIT);
        assert_eq!(body.job_title_or, Some(vec!["Software Engineer".into()]));
        assert_eq!(body.job_country_code_or, Some(vec!["US".into()]));
        assert_eq!(body.posted_at_max_age_days, Some(7));
        assert_eq!(body.remote, Some(true));
        assert_eq!(body.min_salary_usd, Some(80000));
        assert_eq!(body.max_salary_usd, Some(100000));
    }

    #[test]
    fn remote_search_drops_city_pattern() {
        let body = SearchBody::from_criteria(&criteria(), 0);
        assert_eq!(body.job_location_pattern_or, None);

        let mut crit = criteria();
        crit.job_type = Some(JobType::OnSite);
        let body = SearchBody::from_criteria(&crit, 0);
        assert_eq!(
            body.job_location_pattern_or,
            Some(vec!["San Francisco".into()])
        );
        assert_eq!(body.remote, Some(false));
    }

    #[test]
    fn hybrid_search_omits_remote_flag() {
        let mut crit = criteria();
        crit.job_type = Some(JobType::Hybrid);
        let body = SearchBody::from_criteria(&crit, 0);
        assert_eq!(body.remote, None);

        let encoded = serde_json::to_value(&body).unwrap();
        assert!(encoded.get("remote").is_none());
        assert!(encoded.get("job_location_pattern_or").is_some());
    }

    #[test]
    fn one_sided_salary_is_not_sent_upstream() {
        let mut crit = criteria();
        crit.salary_range = Some("$80,000+".into());
        let body = SearchBody::from_criteria(&crit, 0);
        assert_eq!(body.min_salary_usd, None);
        assert_eq!(body.max_salary_usd, None);
    }

    #[test]
    fn stripped_body_keeps_title_country_and_age() {
        let body = SearchBody::from_criteria(&criteria(), 1);
        assert!(body.has_narrowing_filters());

        let fallback = body.stripped();
        assert_eq!(fallback.page, 0);
        assert_eq!(fallback.job_title_or, body.job_title_or);
        assert_eq!(fallback.job_country_code_or, body.job_country_code_or);
        assert_eq!(fallback.posted_at_max_age_days, Some(7));
        assert_eq!(fallback.job_location_pattern_or, None);
        assert_eq!(fallback.remote, None);
        assert_eq!(fallback.min_salary_usd, None);
        assert!(!fallback.has_narrowing_filters());
    }

    #[test]
    fn unwraps_every_known_envelope() {
        let jobs = json!([{"title": "A"}]);
        assert_eq!(unwrap_jobs(&jobs).len(), 1);
        assert_eq!(unwrap_jobs(&json!({"data": [{"title": "A"}]})).len(), 1);
        assert_eq!(
            unwrap_jobs(&json!({"data": {"items": [{"title": "A"}]}})).len(),
            1
        );
        assert_eq!(
            unwrap_jobs(&json!({"data": {"jobs": [{"title": "A"}]}})).len(),
            1
        );
        assert_eq!(unwrap_jobs(&json!({"jobs": [{"title": "A"}]})).len(), 1);
        assert_eq!(unwrap_jobs(&json!({"results": [{"title": "A"}]})).len(), 1);
        assert_eq!(unwrap_jobs(&json!({"items": [{"title": "A"}]})).len(), 1);
        assert_eq!(unwrap_jobs(&json!({"surprise": true})).len(), 0);
    }

    #[test]
    fn maps_wire_fields_with_fallback_chains() {
        let job = json!({
            "id": 4417,
            "job_title": "Platform Engineer",
            "company_object": {"name": "Globex"},
            "description": "Keeps the lights on.",
            "location": "Denver, CO, US",
            "min_annual_salary_usd": 110000,
            "max_annual_salary_usd": 140000,
            "has_remote": "true",
            "date_posted": "2024-06-12",
            "final_url": "https://example.com/4417"
        });

        let candidate = map_job(&job);
        assert_eq!(candidate.provider_id, "4417");
        assert_eq!(candidate.title, "Platform Engineer");
        assert_eq!(candidate.company, "Globex");
        assert_eq!(candidate.city, "Denver");
        assert_eq!(candidate.state, "CO");
        assert_eq!(candidate.country, "US");
        assert_eq!(candidate.min_salary, Some(110000.0));
        assert!(candidate.remote);
        assert_eq!(candidate.apply_link, "https://example.com/4417");
    }

    #[test]
    fn employment_statuses_list_joins() {
        let job = json!({"employment_statuses": ["full_time", "part_time"]});
        assert_eq!(employment_type(&job).as_deref(), Some("full_time, part_time"));
        assert_eq!(employment_type(&json!({})), None);
    }

    #[test]
    fn state_recovers_from_location_text() {
        let job = json!({
            "title": "Engineer",
            "location": "Austin, Texas"
        });
        let candidate = map_job(&job);
        assert_eq!(candidate.city, "Austin");
        assert_eq!(candidate.state, "TX");
    }
}
