use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("cache query failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// One stored response with its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

/// Keyed store for provider response payloads.
///
/// Read contract shared by every implementation: entries older than the TTL
/// are misses, not errors, and stay in place for the next write to refresh.
/// Writes upsert.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(
        &self,
        service: &str,
        payload: &Value,
        ttl_minutes: i64,
    ) -> Result<Option<CachedResponse>, CacheError>;

    async fn set(&self, service: &str, payload: &Value, response: &Value)
        -> Result<(), CacheError>;
}

/// Stable cache key: hex SHA-256 over `"{service}:{canonical payload}"`.
///
/// `serde_json` keeps object keys sorted inside `Value` maps and prints no
/// insignificant whitespace, so structurally equal payloads hash equally
/// regardless of how the call site built them.
pub fn cache_key(service: &str, payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(service.as_bytes());
    hasher.update(b":");
    hasher.update(payload.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// In-process cache used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedResponse>>,
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(
        &self,
        service: &str,
        payload: &Value,
        ttl_minutes: i64,
    ) -> Result<Option<CachedResponse>, CacheError> {
        let key = cache_key(service, payload);
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = entries.get(&key) else {
            return Ok(None);
        };
        let cutoff = Utc::now() - Duration::minutes(ttl_minutes);
        if entry.created_at < cutoff {
            return Ok(None);
        }
        Ok(Some(entry.clone()))
    }

    async fn set(
        &self,
        service: &str,
        payload: &Value,
        response: &Value,
    ) -> Result<(), CacheError> {
        let key = cache_key(service, payload);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CachedResponse { data: response.clone(), created_at: Utc::now() },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_is_stable_across_field_order() {
        let a = json!({"jobTitle": "Engineer", "country": "US"});
        let b = json!({"country": "US", "jobTitle": "Engineer"});
        assert_eq!(cache_key("jsearch", &a), cache_key("jsearch", &b));
    }

    #[test]
    fn key_separates_services_and_payloads() {
        let payload = json!({"jobTitle": "Engineer"});
        assert_ne!(cache_key("jsearch", &payload), cache_key("theirstack", &payload));
        assert_ne!(
            cache_key("jsearch", &payload),
            cache_key("jsearch", &json!({"jobTitle": "Designer"}))
        );
    }

    #[test]
    fn key_is_hex_sha256() {
        let key = cache_key("jsearch", &json!({}));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn stores_and_returns_entries() {
        let cache = MemoryCache::default();
        let payload = json!({"jobTitle": "Engineer"});
        let response = json!({"jobs": [], "total": 0});

        assert!(cache.get("jsearch", &payload, 60).await.unwrap().is_none());
        cache.set("jsearch", &payload, &response).await.unwrap();

        let hit = cache.get("jsearch", &payload, 60).await.unwrap().unwrap();
        assert_eq!(hit.data, response);
    }

    #[tokio::test]
    async fn set_overwrites_previous_entry() {
        let cache = MemoryCache::default();
        let payload = json!({"jobTitle": "Engineer"});

        cache.set("jsearch", &payload, &json!({"total": 1})).await.unwrap();
        cache.set("jsearch", &payload, &json!({"total": 2})).await.unwrap();

        let hit = cache.get("jsearch", &payload, 60).await.unwrap().unwrap();
        assert_eq!(hit.data, json!({"total": 2}));
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let cache = MemoryCache::default();
        let payload = json!({"jobTitle": "Engineer"});
        cache.set("jsearch", &payload, &json!({"total": 1})).await.unwrap();

        // Age the entry past a 7-day TTL.
        {
            let key = cache_key("jsearch", &payload);
            let mut entries = cache.entries.lock().unwrap();
            entries.get_mut(&key).unwrap().created_at = Utc::now() - Duration::days(8);
        }

        assert!(cache.get("jsearch", &payload, 7 * 24 * 60).await.unwrap().is_none());
        // A fresh write brings the key back.
        cache.set("jsearch", &payload, &json!({"total": 3})).await.unwrap();
        assert!(cache.get("jsearch", &payload, 7 * 24 * 60).await.unwrap().is_some());
    }
}
