use deadpool_postgres::{
    Config, CreatePoolError, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::{debug, info};

pub type PgPool = Pool;

pub const DEFAULT_POOL_MAX_SIZE: usize = 25;
const POOL_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DbPoolError {
    #[error("invalid database url: {0}")]
    InvalidConfig(String),
    #[error("{0} is not set")]
    MissingSetting(&'static str),
    #[error("failed to create database pool: {0}")]
    PoolCreation(#[from] CreatePoolError),
    #[error("failed to get postgres connection: {0}")]
    Checkout(#[from] deadpool_postgres::PoolError),
    #[error("database ping failed: {0}")]
    Ping(#[from] tokio_postgres::Error),
}

/// Connection settings given as separate `DB_*` variables instead of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub ssl_mode: String,
}

impl DbSettings {
    /// Reads `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`, `DB_NAME` and
    /// `DB_SSL_MODE` through `lookup`. Everything except the ssl mode is required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DbPoolError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(DbPoolError::MissingSetting(key))
        };

        Ok(Self {
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            host: required("DB_HOST")?,
            port: required("DB_PORT")?,
            dbname: required("DB_NAME")?,
            ssl_mode: lookup("DB_SSL_MODE")
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "prefer".into()),
        })
    }

    pub fn from_env() -> Result<Self, DbPoolError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Key/value connection string; values are quoted so passwords may contain spaces.
    pub fn connection_string(&self) -> String {
        fn quote(value: &str) -> String {
            format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
        }

        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote(&self.host),
            quote(&self.port),
            quote(&self.user),
            quote(&self.password),
            quote(&self.dbname),
            quote(&self.ssl_mode),
        )
    }
}

/// `DATABASE_URL` when given, otherwise the `DB_*` variables.
pub fn resolve_database_url(database_url: Option<String>) -> Result<String, DbPoolError> {
    match database_url.filter(|url| !url.is_empty()) {
        Some(url) => Ok(url),
        None => Ok(DbSettings::from_env()?.connection_string()),
    }
}

pub fn create_pool_from_url(db_url: &str) -> Result<PgPool, DbPoolError> {
    create_pool_with_size(db_url, DEFAULT_POOL_MAX_SIZE)
}

pub fn create_pool_with_size(db_url: &str, max_size: usize) -> Result<PgPool, DbPoolError> {
    let _ = tokio_postgres::Config::from_str(db_url)
        .map_err(|e| DbPoolError::InvalidConfig(e.to_string()))?;

    let mut cfg = Config::new();
    cfg.url = Some(db_url.to_string());

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let mut pool_cfg = PoolConfig::new(max_size.max(1));
    pool_cfg.timeouts.wait = Some(POOL_WAIT_TIMEOUT);
    cfg.pool = Some(pool_cfg);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(DbPoolError::PoolCreation)
}

/// Like [`create_pool_with_size`], but checks out one connection and pings it.
pub async fn create_pool_from_url_checked(
    db_url: &str,
    max_size: usize,
) -> Result<PgPool, DbPoolError> {
    let pool = create_pool_with_size(db_url, max_size)?;
    ping(&pool).await?;

    let status = pool.status();
    info!(max_size = status.max_size, "database connected");
    Ok(pool)
}

pub async fn ping(pool: &PgPool) -> Result<(), DbPoolError> {
    let client = pool.get().await?;
    client.simple_query("SELECT 1").await?;
    Ok(())
}

/// Emit current pool occupancy at debug level.
pub fn log_pool_status(pool: &PgPool) {
    let status = pool.status();
    debug!(
        max_size = status.max_size,
        size = status.size,
        available = status.available,
        waiting = status.waiting,
        "db_pool_status"
    );
}
