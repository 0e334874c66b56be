/// job_cache stores one provider response per (service, cache_key) pair.
/// Expired rows are left in place; reads filter by created_at and writes
/// refresh it.
pub const JOB_CACHE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS job_cache (
    service TEXT NOT NULL,
    cache_key TEXT NOT NULL,
    response JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    PRIMARY KEY (service, cache_key)
);

CREATE INDEX IF NOT EXISTS idx_job_cache_created_at ON job_cache(created_at);
"#;
