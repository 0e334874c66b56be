use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use jr_common::api::{JobPosting, SearchRequest, SearchResponse};
use jr_common::matching::filter_jobs;
use jr_common::providers::JobProvider;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::{AppState, SharedState};

const NO_MATCH_MESSAGE: &str = "No jobs found matching the criteria. \
     Try adjusting your search parameters (e.g., remove location or salary filters).";

pub async fn search_jsearch(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let provider = state.jsearch.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable("JSearch provider is not configured; set RAPID_API_KEY".into())
    })?;
    run_search(&state, provider.as_ref(), payload)
        .await
        .map(Json)
}

pub async fn search_theirstack(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let provider = state.theirstack.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "TheirStack provider is not configured; set THEIRSTACK_API_KEY".into(),
        )
    })?;
    run_search(&state, provider.as_ref(), payload)
        .await
        .map(Json)
}

/// Shared search pipeline: cache lookup, provider fetch, relevance filter,
/// response shaping, cache write-back.
#[instrument(skip_all, fields(service = provider.name()))]
async fn run_search(
    state: &AppState,
    provider: &dyn JobProvider,
    request: SearchRequest,
) -> Result<SearchResponse, ApiError> {
    let service = provider.name();
    let payload = serde_json::to_value(&request)
        .map_err(|err| ApiError::Internal(format!("failed to encode search request: {err}")))?;
    let criteria = request.into_criteria()?;
    let config = state.engine.config();

    if let Some(cached) = read_cache(state, service, &payload, config.cache_ttl_minutes).await {
        return Ok(cached);
    }

    let candidates = provider.fetch(&criteria, config.search_pages).await?;
    let matched = filter_jobs(
        &state.engine,
        &criteria,
        candidates,
        config.min_score_threshold,
        Utc::now(),
    );

    if matched.is_empty() {
        return Err(ApiError::NotFound(NO_MATCH_MESSAGE.into()));
    }

    let jobs: Vec<JobPosting> = matched
        .iter()
        .take(config.result_limit)
        .enumerate()
        .map(|(idx, (job, _))| JobPosting::from_candidate(service, idx, job, &criteria))
        .collect();
    let response = SearchResponse {
        total: jobs.len(),
        jobs,
    };

    write_cache(state, service, &payload, &response).await;
    info!(service, total = response.total, "search completed");
    Ok(response)
}

/// Cache lookup that never fails the request. An empty cached result reads
/// as a miss so one thin provider response does not pin "no jobs" for a
/// whole TTL window.
async fn read_cache(
    state: &AppState,
    service: &str,
    payload: &Value,
    ttl_minutes: i64,
) -> Option<SearchResponse> {
    let cached = match state.cache.get(service, payload, ttl_minutes).await {
        Ok(hit) => hit?,
        Err(err) => {
            warn!(service, error = %err, "cache lookup failed");
            return None;
        }
    };

    match serde_json::from_value::<SearchResponse>(cached.data) {
        Ok(response) if !response.jobs.is_empty() => {
            info!(service, total = response.total, "serving cached response");
            Some(response)
        }
        Ok(_) => None,
        Err(err) => {
            warn!(service, error = %err, "cached response failed to decode");
            None
        }
    }
}

async fn write_cache(state: &AppState, service: &str, payload: &Value, response: &SearchResponse) {
    let data = match serde_json::to_value(response) {
        Ok(data) => data,
        Err(err) => {
            warn!(service, error = %err, "failed to encode response for caching");
            return;
        }
    };
    if let Err(err) = state.cache.set(service, payload, &data).await {
        warn!(service, error = %err, "failed to store response in cache");
    }
}
