pub mod jsearch;
pub mod theirstack;

pub use jsearch::JSearchProvider;
pub use theirstack::TheirStackProvider;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::{CandidateJob, SearchCriteria};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}")]
    Http { provider: &'static str, status: u16 },
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{provider} response was not valid JSON")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One upstream job-search API. Implementations own their wire format and
/// hand back provider-agnostic candidates.
#[async_trait]
pub trait JobProvider: Send + Sync {
    /// Cache namespace and log label for this provider.
    fn name(&self) -> &'static str;

    /// Fetch up to `pages` pages of candidates for the given criteria.
    async fn fetch(
        &self,
        criteria: &SearchCriteria,
        pages: u32,
    ) -> Result<Vec<CandidateJob>, ProviderError>;
}

pub(crate) fn decode_body(provider: &'static str, body: &str) -> Result<Value, ProviderError> {
    serde_json::from_str(body).map_err(|source| ProviderError::Decode { provider, source })
}

/// First key holding a non-blank string (numbers are stringified, so numeric
/// ids survive).
pub(crate) fn opt_str_field(job: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match job.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

pub(crate) fn str_field(job: &Value, keys: &[&str]) -> String {
    opt_str_field(job, keys).unwrap_or_default()
}

pub(crate) fn num_field(job: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match job.get(key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().replace(',', "").parse::<f64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remote flags arrive as booleans or as strings like `"true"` or `"Remote"`.
pub(crate) fn bool_field(job: &Value, keys: &[&str]) -> bool {
    for key in keys {
        match job.get(key) {
            Some(Value::Bool(b)) => return *b,
            Some(Value::String(s)) if !s.trim().is_empty() => {
                let lowered = s.trim().to_lowercase();
                return matches!(lowered.as_str(), "true" | "yes" | "remote" | "1");
            }
            _ => {}
        }
    }
    false
}
