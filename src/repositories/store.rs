//! PostgreSQL connection pool wrapper.

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::config::PostgresConfig;
use crate::error::AppError;

/// Largest identifier list sent in a single `= ANY($n)` parameter. Longer
/// lists are split into sublists and the results concatenated.
pub const MAX_LIST_SIZE: usize = 16_000;

/// Pooled store handle.
///
/// Cheap to clone - the underlying connection pool is `Arc`-based.
#[derive(Clone)]
pub struct Store {
    pool: Pool,
}

impl Store {
    /// Creates the connection pool and verifies the database is reachable.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config = config
            .uri
            .parse()
            .map_err(|e: tokio_postgres::Error| AppError::Connection(e.to_string()))?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| AppError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.client().await?;
        Ok(store)
    }

    /// Gets a connection from the pool.
    pub async fn client(&self) -> Result<Object, AppError> {
        Ok(self.pool.get().await?)
    }
}
