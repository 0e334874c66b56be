use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use axum::{
    body::Body,
    extract::{connect_info::ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};

use crate::error::ApiError;
use crate::SharedState;

/// Once the client table grows past this, recording sweeps out clients whose
/// whole history has aged beyond the hour window.
const SWEEP_THRESHOLD: usize = 512;

/// Request tallies for one client key, including the request being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounts {
    pub last_minute: u32,
    pub last_hour: u32,
}

/// Counts requests per client key. Recording and reading are one operation:
/// the returned counts already include the request being recorded, so a
/// rejected request still consumes quota.
pub trait RateCounter: Send + Sync {
    fn record(&self, key: &str, now: DateTime<Utc>) -> WindowCounts;
}

/// In-memory sliding-window counter keyed by client identity.
#[derive(Debug, Default)]
pub struct SlidingWindowCounter {
    hits: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl RateCounter for SlidingWindowCounter {
    fn record(&self, key: &str, now: DateTime<Utc>) -> WindowCounts {
        let hour_ago = now - Duration::hours(1);
        let minute_ago = now - Duration::minutes(1);

        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        if hits.len() > SWEEP_THRESHOLD {
            hits.retain(|_, stamps| stamps.iter().any(|t| *t > hour_ago));
        }

        let stamps = hits.entry(key.to_string()).or_default();
        stamps.retain(|t| *t > hour_ago);
        stamps.push(now);

        WindowCounts {
            last_minute: stamps.iter().filter(|t| **t > minute_ago).count() as u32,
            last_hour: stamps.len() as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub per_minute: u32,
    pub per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: 30,
            per_hour: 500,
        }
    }
}

impl RateLimitConfig {
    fn parse_env_u32(name: &str) -> Option<u32> {
        env::var(name)
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
    }

    fn parse_env_flag(name: &str) -> Option<bool> {
        env::var(name)
            .ok()
            .map(|value| !(value == "0" || value.eq_ignore_ascii_case("false")))
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: Self::parse_env_flag("JR_RATE_LIMIT_ENABLED").unwrap_or(defaults.enabled),
            per_minute: Self::parse_env_u32("JR_RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.per_minute),
            per_hour: Self::parse_env_u32("JR_RATE_LIMIT_PER_HOUR").unwrap_or(defaults.per_hour),
        }
    }
}

/// Client identity for limiting: proxy headers first, then the socket peer.
fn client_key(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded
            .split(',')
            .next()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            return first.to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
    {
        return real_ip.to_string();
    }

    if let Some(info) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return info.0.ip().to_string();
    }

    "unknown".to_string()
}

fn is_exempt(path: &str) -> bool {
    matches!(path, "/health" | "/livez" | "/readyz")
}

pub async fn enforce_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let limits = &state.rate_limits;
    if !limits.enabled || is_exempt(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let key = client_key(&req);
    let counts = state.counter.record(&key, Utc::now());

    if counts.last_minute > limits.per_minute {
        return Err(ApiError::TooManyRequests(format!(
            "Rate limit exceeded: {}/{} requests per minute",
            counts.last_minute, limits.per_minute
        )));
    }
    if counts.last_hour > limits.per_hour {
        return Err(ApiError::TooManyRequests(format!(
            "Rate limit exceeded: {}/{} requests per hour",
            counts.last_hour, limits.per_hour
        )));
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit-minute", HeaderValue::from(limits.per_minute));
    headers.insert("x-ratelimit-limit-hour", HeaderValue::from(limits.per_hour));
    Ok(response)
}
