use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cache::{cache_key, CacheError, CachedResponse, ResponseCache};
use crate::db::PgPool;

/// Postgres-backed response cache over the job_cache table.
///
/// Reads treat rows older than the TTL as misses without deleting them;
/// the next write for the same key refreshes the row in place.
pub struct PgCache {
    pool: PgPool,
}

impl PgCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseCache for PgCache {
    #[instrument(skip(self, payload))]
    async fn get(
        &self,
        service: &str,
        payload: &Value,
        ttl_minutes: i64,
    ) -> Result<Option<CachedResponse>, CacheError> {
        let key = cache_key(service, payload);
        let client = self.pool.get().await?;

        let stmt = client
            .prepare_cached(
                "SELECT response, created_at FROM job_cache \
                 WHERE service = $1 AND cache_key = $2 \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .await?;
        let Some(row) = client.query_opt(&stmt, &[&service, &key]).await? else {
            return Ok(None);
        };

        let created_at: DateTime<Utc> = row.get("created_at");
        let cutoff = Utc::now() - Duration::minutes(ttl_minutes);
        if created_at < cutoff {
            debug!(service, "cache entry expired");
            return Ok(None);
        }

        let data: Value = row.get("response");
        Ok(Some(CachedResponse { data, created_at }))
    }

    #[instrument(skip(self, payload, response))]
    async fn set(
        &self,
        service: &str,
        payload: &Value,
        response: &Value,
    ) -> Result<(), CacheError> {
        let key = cache_key(service, payload);
        let client = self.pool.get().await?;

        let stmt = client
            .prepare_cached(
                "INSERT INTO job_cache (service, cache_key, response, created_at) \
                 VALUES ($1, $2, $3, NOW()) \
                 ON CONFLICT (service, cache_key) \
                 DO UPDATE SET response = EXCLUDED.response, created_at = NOW()",
            )
            .await?;
        client.execute(&stmt, &[&service, &key, response]).await?;
        Ok(())
    }
}
