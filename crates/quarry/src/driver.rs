//! Driver trait for parameterized statement execution.

use crate::config::DatabaseConfig;
use crate::error::DbResult;
use crate::params::Params;
use crate::record::Record;

/// The boundary to an underlying relational database driver.
///
/// Statements arrive with `:name` placeholders and a [`Params`] map; the driver
/// prepares the statement fresh on every call (no statement caching), binds the
/// parameters by name, and maps result rows into [`Record`]s. Errors from the
/// database are returned as-is.
///
/// All methods block until the database answers.
pub trait Driver {
    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &Params) -> DbResult<Vec<Record>>;

    /// Execute a query and return the first row, if any.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 or more rows: returns `Ok(Some(first_row))` (does **not** error)
    ///
    /// The default implementation fetches every row and keeps the first one;
    /// drivers that can stop after one row should override it.
    fn query_opt(&self, sql: &str, params: &Params) -> DbResult<Option<Record>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &Params) -> DbResult<u64>;

    /// The id this session most recently generated for `table`.
    ///
    /// Returns `Ok(None)` when `table` has no auto-increment key or the session
    /// has not generated an id for it. Ids generated for other tables are
    /// never reported.
    fn last_insert_id(&self, table: &str) -> DbResult<Option<i64>>;
}

impl<D: Driver + ?Sized> Driver for &D {
    fn query(&self, sql: &str, params: &Params) -> DbResult<Vec<Record>> {
        (**self).query(sql, params)
    }

    fn query_opt(&self, sql: &str, params: &Params) -> DbResult<Option<Record>> {
        (**self).query_opt(sql, params)
    }

    fn execute(&self, sql: &str, params: &Params) -> DbResult<u64> {
        (**self).execute(sql, params)
    }

    fn last_insert_id(&self, table: &str) -> DbResult<Option<i64>> {
        (**self).last_insert_id(table)
    }
}

/// A driver that can be opened from a [`DatabaseConfig`].
///
/// Used by [`Database`](crate::Database) to create its connection lazily.
pub trait Connect: Driver + Sized {
    fn connect(config: &DatabaseConfig) -> DbResult<Self>;
}
