use axum::{extract::State, Json};
use serde_json::json;
use tokio::time::{timeout, Duration};

use crate::error::ApiError;
use crate::SharedState;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    let Some(pool) = state.pool.as_ref() else {
        return Ok(Json(json!({
            "status": "ok",
            "database": "not_configured",
            "application": env!("CARGO_PKG_NAME"),
        })));
    };

    let client = timeout(READINESS_TIMEOUT, pool.get())
        .await
        .map_err(|_| ApiError::ServiceUnavailable("db_pool_timeout".into()))
        .and_then(|result| {
            result.map_err(|err| {
                ApiError::ServiceUnavailable(format!("failed to check out pool connection: {err}"))
            })
        })?;

    timeout(READINESS_TIMEOUT, client.simple_query("SELECT 1"))
        .await
        .map_err(|_| ApiError::ServiceUnavailable("db_ping_timeout".into()))
        .and_then(|result| {
            result
                .map_err(|err| ApiError::ServiceUnavailable(format!("health check failed: {err}")))
        })?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
        "application": env!("CARGO_PKG_NAME"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn state_with_readiness(ready: bool) -> SharedState {
        let state = crate::test_state("test-key");
        state.readiness.store(ready, Ordering::SeqCst);
        state
    }

    #[tokio::test]
    async fn readyz_rejects_when_readiness_disabled() {
        let state = state_with_readiness(false);

        let result = readyz(State(state)).await;

        match result {
            Err(ApiError::ServiceUnavailable(code)) => {
                assert!(code.contains("shutting_down"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn readyz_reports_an_unconfigured_database() {
        let state = state_with_readiness(true);

        let Json(body) = readyz(State(state)).await.unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "not_configured");
    }
}
