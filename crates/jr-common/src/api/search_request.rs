use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::correct_job_type;
use crate::SearchCriteria;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("jobTitle must not be empty")]
    MissingTitle,
}

/// Search request as the frontend sends it. Every field except the title may
/// be blank; blank means the caller did not constrain that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub job_title: String,
    pub industry: String,
    pub salary_min: String,
    pub salary_max: String,
    pub job_type: String,
    pub city: String,
    pub country: String,
    pub date_posted: String,
}

impl SearchRequest {
    /// Convert the wire request into the internal criteria shape.
    ///
    /// `salaryMin`/`salaryMax` collapse into one salary-range string, the
    /// job-type label is normalized, and the country defaults to `"US"`.
    /// The frontend has no separate state field, so `location_state` stays
    /// unset here.
    pub fn into_criteria(self) -> Result<SearchCriteria, RequestError> {
        let title = self.job_title.trim().to_string();
        if title.is_empty() {
            return Err(RequestError::MissingTitle);
        }

        let salary_min = non_blank(&self.salary_min);
        let salary_max = non_blank(&self.salary_max);
        let salary_range = match (salary_min, salary_max) {
            (Some(min), Some(max)) => Some(format!("${min} - ${max}")),
            (Some(min), None) => Some(format!("${min}+")),
            (None, Some(max)) => Some(format!("Up to ${max}")),
            (None, None) => None,
        };

        let country = non_blank(&self.country)
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| "US".to_string());

        Ok(SearchCriteria {
            title,
            industry: non_blank(&self.industry).map(str::to_string),
            salary_range,
            job_type: correct_job_type(&self.job_type),
            location_city: non_blank(&self.city).map(str::to_string),
            location_state: None,
            country: Some(country),
            date_posted: non_blank(&self.date_posted).map(str::to_string),
        })
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
