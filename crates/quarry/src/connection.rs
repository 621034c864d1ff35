//! A single database connection.

use crate::builder::{QueryBuilder, Raw};
use crate::driver::Driver;
use crate::error::{DbError, DbResult};
use crate::params::Params;
use crate::record::FromRow;
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// The kind of statement being executed, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Other => "other",
        }
    }
}

/// Logging options for a [`Connection`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Statements at least this slow are logged at WARN instead of DEBUG.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

/// Cut `sql` to at most `max` bytes on a char boundary.
pub(crate) fn truncate_sql(sql: &str, max: Option<usize>) -> Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while !sql.is_char_boundary(end) {
                end -= 1;
            }
            Cow::Owned(format!("{}...", &sql[..end]))
        }
        _ => Cow::Borrowed(sql),
    }
}

/// Executes statements through one [`Driver`].
///
/// Every call prepares its statement fresh and binds `params` by name. Driver
/// errors are returned unchanged; there are no retries and no transactions.
///
/// # Example
///
/// ```ignore
/// let conn = Connection::new(PgDriver::connect(&config)?);
///
/// let adults = conn
///     .table("users")
///     .and_where("age >= :age", params! { "age" => 18 })
///     .get()?;
/// ```
#[derive(Debug)]
pub struct Connection<D> {
    driver: D,
    options: ConnectionOptions,
}

impl<D: Driver> Connection<D> {
    pub fn new(driver: D) -> Self {
        Self::with_options(driver, ConnectionOptions::default())
    }

    pub fn with_options(driver: D, options: ConnectionOptions) -> Self {
        Self { driver, options }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Start a query builder for `table`.
    pub fn table(&self, table: impl Into<Raw>) -> QueryBuilder<'_, D> {
        self.query().from(table)
    }

    /// Start a query builder with no table set.
    pub fn query(&self) -> QueryBuilder<'_, D> {
        QueryBuilder::new(self)
    }

    /// Run a select statement and map every row to `T`.
    pub fn select<T: FromRow>(&self, sql: &str, params: &Params) -> DbResult<Vec<T>> {
        let rows = self.run(StatementKind::Select, sql, params, |d| d.query(sql, params))?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run a select statement and map the first row, if any, to `T`.
    pub fn select_one<T: FromRow>(&self, sql: &str, params: &Params) -> DbResult<Option<T>> {
        let row = self.run(StatementKind::Select, sql, params, |d| {
            d.query_opt(sql, params)
        })?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Run an insert statement.
    pub fn insert(&self, sql: &str, params: &Params) -> DbResult<bool> {
        self.persist(StatementKind::Insert, sql, params)
    }

    /// Run an update statement.
    pub fn update(&self, sql: &str, params: &Params) -> DbResult<bool> {
        self.persist(StatementKind::Update, sql, params)
    }

    /// Run a delete statement.
    pub fn delete(&self, sql: &str, params: &Params) -> DbResult<bool> {
        self.persist(StatementKind::Delete, sql, params)
    }

    /// Run any statement and return the number of affected rows.
    pub fn affecting_statement(&self, sql: &str, params: &Params) -> DbResult<u64> {
        self.run(StatementKind::Other, sql, params, |d| d.execute(sql, params))
    }

    /// The id most recently generated for `table` on this connection.
    ///
    /// Fails with [`DbError::NoInsertId`] when there is none.
    pub fn last_insert_id(&self, table: &str) -> DbResult<i64> {
        self.driver.last_insert_id(table)?.ok_or(DbError::NoInsertId)
    }

    // Success means the driver accepted the statement; zero affected rows is still success.
    fn persist(&self, kind: StatementKind, sql: &str, params: &Params) -> DbResult<bool> {
        self.run(kind, sql, params, |d| d.execute(sql, params))
            .map(|_| true)
    }

    fn run<R>(
        &self,
        kind: StatementKind,
        sql: &str,
        params: &Params,
        f: impl FnOnce(&D) -> DbResult<R>,
    ) -> DbResult<R> {
        let start = Instant::now();
        let result = f(&self.driver);
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        let sql = truncate_sql(sql, self.options.max_sql_length);

        match &result {
            Ok(_) => {
                let slow = self
                    .options
                    .slow_query_threshold
                    .is_some_and(|threshold| elapsed >= threshold);
                if slow {
                    tracing::warn!(
                        target: "quarry.sql",
                        kind = kind.as_str(),
                        param_count = params.len(),
                        elapsed_ms,
                        sql = %sql,
                        "slow query"
                    );
                } else {
                    tracing::debug!(
                        target: "quarry.sql",
                        kind = kind.as_str(),
                        param_count = params.len(),
                        elapsed_ms,
                        sql = %sql,
                        "query executed"
                    );
                }
            }
            Err(err) => {
                tracing::debug!(
                    target: "quarry.sql",
                    kind = kind.as_str(),
                    param_count = params.len(),
                    elapsed_ms,
                    sql = %sql,
                    error = %err,
                    "query failed"
                );
            }
        }

        result
    }
}
