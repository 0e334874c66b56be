use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{bool_field, decode_body, num_field, opt_str_field, str_field, JobProvider, ProviderError};
use crate::normalize::DateWindow;
use crate::{CandidateJob, JobType, SearchCriteria};

const SEARCH_URL: &str = "https://jsearch.p.rapidapi.com/search";
const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSearch client (RapidAPI). Pages are fetched one request each and
/// concatenated.
pub struct JSearchProvider {
    client: Client,
    api_key: String,
}

impl JSearchProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl JobProvider for JSearchProvider {
    fn name(&self) -> &'static str {
        "jsearch"
    }

    #[instrument(skip(self, criteria), fields(provider = "jsearch"))]
    async fn fetch(
        &self,
        criteria: &SearchCriteria,
        pages: u32,
    ) -> Result<Vec<CandidateJob>, ProviderError> {
        let mut jobs = Vec::new();

        for page in 1..=pages {
            let params = query_params(criteria, page);
            let response = self
                .client
                .get(SEARCH_URL)
                .header("x-rapidapi-key", &self.api_key)
                .header("x-rapidapi-host", RAPIDAPI_HOST)
                .query(&params)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::Http {
                    provider: "jsearch",
                    status: status.as_u16(),
                });
            }

            let body = decode_body("jsearch", &response.text().await?)?;
            let Some(page_jobs) = body.get("data").and_then(Value::as_array) else {
                warn!(page, "response carried no data array");
                continue;
            };

            info!(page, jobs_on_page = page_jobs.len(), "fetched search page");
            jobs.extend(page_jobs.iter().map(map_job));
        }

        Ok(jobs)
    }
}

/// Query parameters for one page. The `query` term carries every criterion
/// the caller set, the rest are the engine's native filters.
fn query_params(criteria: &SearchCriteria, page: u32) -> Vec<(&'static str, String)> {
    let mut query_parts = vec![criteria.title.clone()];
    for part in [
        criteria.industry.as_deref(),
        criteria.location_city.as_deref(),
        criteria.location_state.as_deref(),
        criteria.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        let part = part.trim();
        if !part.is_empty() {
            query_parts.push(part.to_string());
        }
    }

    let mut params = vec![
        ("query", query_parts.join(" ")),
        ("page", page.to_string()),
        ("num_pages", "1".to_string()),
    ];

    let location: Vec<&str> = [
        criteria.location_city.as_deref(),
        criteria.location_state.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect();
    if !location.is_empty() {
        params.push(("location", location.join(", ")));
    }

    if let Some(country) = criteria.country.as_deref().map(str::trim) {
        if !country.is_empty() {
            params.push(("country", country.to_lowercase()));
        }
    }

    if criteria.effective_job_type() == JobType::Remote {
        params.push(("work_from_home", "true".to_string()));
    }

    let window = criteria
        .date_posted
        .as_deref()
        .map(DateWindow::from_criterion)
        .unwrap_or(DateWindow::Any);
    params.push(("date_posted", date_posted_param(window).to_string()));

    params
}

fn date_posted_param(window: DateWindow) -> &'static str {
    match window {
        DateWindow::Day => "today",
        DateWindow::Week => "week",
        DateWindow::Month => "month",
        DateWindow::Any => "all",
    }
}

fn map_job(job: &Value) -> CandidateJob {
    let city = str_field(job, &["job_city"]);
    let state = str_field(job, &["job_state"]);
    let location: String = [city.as_str(), state.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    CandidateJob {
        provider_id: str_field(job, &["job_id"]),
        title: str_field(job, &["job_title"]),
        company: str_field(job, &["employer_name"]),
        description: str_field(job, &["job_description"]),
        location,
        city,
        state,
        country: str_field(job, &["job_country"]),
        min_salary: num_field(job, &["job_min_salary"]),
        max_salary: num_field(job, &["job_max_salary"]),
        salary_currency: opt_str_field(job, &["job_salary_currency"]),
        employment_type: opt_str_field(job, &["job_employment_type"]),
        remote: bool_field(job, &["job_is_remote"]),
        posted_at: opt_str_field(job, &["job_posted_at_datetime_utc"]),
        apply_link: str_field(job, &["job_apply_link"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            title: "Software Engineer".into(),
            industry: Some("Technology".into()),
            location_city: Some("San Francisco".into()),
            location_state: Some("CA".into()),
            country: Some("US".into()),
            date_posted: Some("week".into()),
            ..Default::default()
        }
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn query_joins_every_criterion_term() {
        let params = query_params(&criteria(), 1);
        assert_eq!(
            param(&params, "query"),
            Some("Software Engineer Technology San Francisco CA US")
        );
        assert_eq!(param(&params, "location"), Some("San Francisco, CA"));
        assert_eq!(param(&params, "country"), Some("us"));
        assert_eq!(param(&params, "page"), Some("1"));
        assert_eq!(param(&params, "num_pages"), Some("1"));
        assert_eq!(param(&params, "date_posted"), Some("week"));
    }

    #[test]
    fn remote_searches_request_work_from_home() {
        let mut crit = criteria();
        crit.job_type = Some(JobType::Remote);
        let params = query_params(&crit, 1);
        assert_eq!(param(&params, "work_from_home"), Some("true"));

        crit.job_type = Some(JobType::OnSite);
        let params = query_params(&crit, 1);
        assert_eq!(param(&params, "work_from_home"), None);
    }

    #[test]
    fn unset_job_type_defaults_to_remote_search() {
        let mut crit = criteria();
        crit.job_type = None;
        let params = query_params(&crit, 1);
        assert_eq!(param(&params, "work_from_home"), Some("true"));
    }

    #[test]
    fn bare_title_search_sends_minimal_params() {
        let crit = SearchCriteria {
            title: "Engineer".into(),
            ..Default::default()
        };
        let params = query_params(&crit, 2);
        assert_eq!(param(&params, "query"), Some("Engineer"));
        assert_eq!(param(&params, "location"), None);
        assert_eq!(param(&params, "country"), None);
        assert_eq!(param(&params, "page"), Some("2"));
        assert_eq!(param(&params, "date_posted"), Some("all"));
    }

    #[test]
    fn date_buckets_use_engine_values() {
        assert_eq!(date_posted_param(DateWindow::Day), "today");
        assert_eq!(date_posted_param(DateWindow::Week), "week");
        assert_eq!(date_posted_param(DateWindow::Month), "month");
        assert_eq!(date_posted_param(DateWindow::Any), "all");
    }

    #[test]
    fn maps_wire_fields_to_candidate() {
        let job = json!({
            "job_id": "abc123",
            "job_title": "Backend Engineer",
            "employer_name": "Initech",
            "job_description": "Rust services.",
            "job_city": "Austin",
            "job_state": "TX",
            "job_country": "US",
            "job_min_salary": 95000,
            "job_max_salary": 130000,
            "job_salary_currency": "USD",
            "job_employment_type": "FULLTIME",
            "job_is_remote": true,
            "job_posted_at_datetime_utc": "2024-06-10T08:30:00Z",
            "job_apply_link": "https://example.com/apply"
        });

        let candidate = map_job(&job);
        assert_eq!(candidate.provider_id, "abc123");
        assert_eq!(candidate.title, "Backend Engineer");
        assert_eq!(candidate.company, "Initech");
        assert_eq!(candidate.location, "Austin, TX");
        assert_eq!(candidate.min_salary, Some(95000.0));
        assert_eq!(candidate.max_salary, Some(130000.0));
        assert!(candidate.remote);
        assert_eq!(candidate.posted_at.as_deref(), Some("2024-06-10T08:30:00Z"));
        assert_eq!(candidate.apply_link, "https://example.com/apply");
    }

    #[test]
    fn missing_wire_fields_default() {
        let candidate = map_job(&json!({"job_title": "Engineer"}));
        assert_eq!(candidate.company, "");
        assert_eq!(candidate.location, "");
        assert_eq!(candidate.min_salary, None);
        assert!(!candidate.remote);
        assert_eq!(candidate.posted_at, None);
    }
}
