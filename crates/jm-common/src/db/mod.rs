pub mod ingest;
pub mod listings;
pub mod migrations;
pub mod pool;
pub mod retention;
pub mod util;

pub use ingest::{UpsertError, UpsertReport, upsert_listings, upsert_query};
pub use listings::{PgListingStore, candidate_query, contains_pattern, escape_like};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{
    DEFAULT_POOL_MAX_SIZE, DbPoolError, DbSettings, PgPool, create_pool_from_url,
    create_pool_from_url_checked, create_pool_with_size, log_pool_status, ping,
    resolve_database_url,
};
pub use retention::{
    RetentionError, count_listings, count_listings_before, purge_listings_before,
    retention_cutoff,
};
