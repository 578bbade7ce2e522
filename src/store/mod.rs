//! Domain store
//!
//! An embedded SQLite database holding season snapshots. One `DomainStore`
//! handle is scoped to one ingestion run or one read session; nothing goes
//! through globals, so concurrent runs can use independent handles.

pub mod reader;
pub mod schema;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::error::AppError;

/// Handle to the snapshot database.
#[derive(Debug, Clone)]
pub struct DomainStore {
    pool: SqlitePool,
}

impl DomainStore {
    /// Opens (creating if missing) the snapshot database at `database_path`
    /// and ensures the schema exists. Pass `":memory:"` for an ephemeral
    /// store.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let options = if database_path == ":memory:" {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(database_path)
                .create_if_missing(true)
        };
        let options = options.foreign_keys(true);

        // A single connection keeps in-memory stores coherent and serializes
        // writer transactions.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = DomainStore { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        for statement in schema::create_table_statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        debug!("Snapshot schema ensured");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Row count of one table for one season scope.
    pub async fn count_rows(&self, table: &str, season: &str) -> Result<i64, AppError> {
        let scope = schema::DELETE_ORDER
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, scope)| *scope)
            .ok_or_else(|| AppError::config_error(format!("Unknown table: {table}")))?;

        let sql = format!("SELECT COUNT(*) FROM {table} WHERE {scope} = ?");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(season)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
