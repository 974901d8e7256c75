use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::reservation_repo::PostgresAvailabilityStore;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        info!("Connected to Postgres (pool of {})", config.max_connections);
        Ok(Self { pool })
    }

    /// Creates the `suites` and `mesas` collections and their uniqueness
    /// constraints if missing.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Applying reservation schema...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Reservation schema up to date.");
        Ok(())
    }

    pub fn availability_store(&self) -> PostgresAvailabilityStore {
        PostgresAvailabilityStore::new(self.pool.clone())
    }
}
