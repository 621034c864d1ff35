//! Caller-owned registry of one lazily opened connection.

use crate::builder::{QueryBuilder, Raw};
use crate::config::DatabaseConfig;
use crate::connection::Connection;
use crate::driver::Connect;
use crate::error::DbResult;
use crate::postgres::PgDriver;
use std::sync::OnceLock;

/// Holds a [`DatabaseConfig`] and opens one [`Connection`] on first use.
///
/// There is no global instance: create a `Database` where the application
/// starts and pass it (or a reference) to the code that needs it. A failed
/// connect is not cached, so the next call tries again.
///
/// ```ignore
/// let db = Database::<PgDriver>::new(DatabaseConfig::from_env()?);
/// let users = db.table("users")?.get()?;
/// ```
#[derive(Debug)]
pub struct Database<D = PgDriver> {
    config: DatabaseConfig,
    connection: OnceLock<Connection<D>>,
}

impl<D: Connect> Database<D> {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            connection: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether the connection has been opened yet.
    pub fn is_connected(&self) -> bool {
        self.connection.get().is_some()
    }

    /// The connection, opening it on first call.
    pub fn connection(&self) -> DbResult<&Connection<D>> {
        if let Some(conn) = self.connection.get() {
            return Ok(conn);
        }

        let driver = D::connect(&self.config)?;
        tracing::info!(
            target: "quarry.driver",
            host = %self.config.host,
            database = %self.config.database,
            "database connection opened"
        );
        let conn = Connection::with_options(driver, self.config.connection_options());
        // Another thread may have won the race; keep whichever got there first.
        Ok(self.connection.get_or_init(|| conn))
    }

    /// Start a query builder for `table` on the shared connection.
    pub fn table(&self, table: impl Into<Raw>) -> DbResult<QueryBuilder<'_, D>> {
        Ok(self.connection()?.table(table))
    }
}
