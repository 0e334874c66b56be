pub mod api;
pub mod cache;
pub mod db;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod providers;
pub mod schema;

// Commonly used data models for the matching functions.

/// Desired work arrangement from the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobType {
    OnSite,
    #[default]
    Remote,
    Hybrid,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::OnSite => "On site",
            JobType::Remote => "Remote",
            JobType::Hybrid => "Hybrid",
        }
    }
}

/// Canonical search criteria after request validation.
///
/// `title` is always non-empty; every other field is `None` when the caller
/// left it blank, and an absent field is excluded from scoring entirely.
/// An absent `job_type` still behaves as Remote for provider queries and
/// the location bypass, via [`SearchCriteria::effective_job_type`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub title: String,
    pub industry: Option<String>,
    pub salary_range: Option<String>,
    pub job_type: Option<JobType>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub country: Option<String>,
    pub date_posted: Option<String>,
}

impl SearchCriteria {
    /// Arrangement used outside scoring: the stated one, or the default.
    pub fn effective_job_type(&self) -> JobType {
        self.job_type.unwrap_or_default()
    }
}

/// Provider-agnostic view of one raw job record.
///
/// Providers fill what they have; missing text fields stay empty and missing
/// numeric fields stay `None`. The matcher never mutates a candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateJob {
    pub provider_id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub salary_currency: Option<String>,
    pub employment_type: Option<String>,
    pub remote: bool,
    pub posted_at: Option<String>,
    pub apply_link: String,
}
