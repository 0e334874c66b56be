pub mod migrations;
pub mod pool;
pub mod response_cache;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, DbPoolError, PgPool};
pub use response_cache::PgCache;
