//! Blocking PostgreSQL driver on top of `tokio-postgres`.

use crate::config::DatabaseConfig;
use crate::driver::{Connect, Driver};
use crate::error::{DbError, DbResult};
use crate::params::Params;
use crate::placeholder::bind_named;
use crate::record::Record;
use crate::value::Value;
use futures_util::{TryStreamExt, pin_mut};
use std::error::Error as _;
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};

/// A PostgreSQL session driven from synchronous code.
///
/// Owns a single-threaded tokio runtime; every call blocks on it, and the
/// connection task makes progress while a call is in flight. Do not call
/// into a `PgDriver` from inside another tokio runtime.
///
/// Statements use unnamed prepared statements, so nothing is cached between
/// calls. Connects with `NoTls`.
pub struct PgDriver {
    client: Client,
    runtime: Runtime,
}

impl PgDriver {
    /// Open a session for `config`.
    pub fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let pg_config = config.to_pg_config()?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbError::Connection(format!("failed to start runtime: {e}")))?;

        let (client, connection) = runtime
            .block_on(pg_config.connect(NoTls))
            .map_err(|e| DbError::Connection(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "quarry.driver", error = %e, "postgres connection error");
            }
        });

        tracing::debug!(target: "quarry.driver", "postgres session opened");
        Ok(Self { client, runtime })
    }

    /// Open a session from a connection URL.
    pub fn connect_url(url: &str) -> DbResult<Self> {
        Self::connect(&DatabaseConfig::from_url(url))
    }

    /// The underlying async client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run a raw batch (no parameters), e.g. DDL in tests and scripts.
    pub fn batch_execute(&self, sql: &str) -> DbResult<()> {
        self.runtime
            .block_on(self.client.batch_execute(sql))
            .map_err(DbError::from_db_error)
    }
}

impl std::fmt::Debug for PgDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDriver")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

/// First serial or identity sequence owned by a column of the table, if any.
///
/// `to_regclass` yields NULL for names it cannot resolve, which leaves no rows.
const SERIAL_SEQUENCE_SQL: &str = "\
    select seq from (\
        select pg_get_serial_sequence($1::text, a.attname::text) as seq, a.attnum \
        from pg_attribute a \
        where a.attrelid = to_regclass($1::text) and a.attnum > 0 and not a.attisdropped\
    ) cols where seq is not null order by attnum limit 1";

fn record_from_row(row: &Row) -> DbResult<Record> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            row.try_get::<_, Value>(idx)
                .map(|value| (column.name().to_string(), value))
                .map_err(|e| DbError::decode(column.name(), error_chain(&e)))
        })
        .collect()
}

// tokio-postgres wraps conversion failures; the cause is in `source()`.
fn error_chain(err: &tokio_postgres::Error) -> String {
    let message = err.to_string();
    match err.source() {
        Some(source) if !message.ends_with(&source.to_string()) => format!("{message}: {source}"),
        _ => message,
    }
}

impl Driver for PgDriver {
    fn query(&self, sql: &str, params: &Params) -> DbResult<Vec<Record>> {
        let bound = bind_named(sql, params)?;
        let rows = self
            .runtime
            .block_on(self.client.query(bound.sql.as_str(), &bound.as_refs()))
            .map_err(DbError::from_db_error)?;
        rows.iter().map(record_from_row).collect()
    }

    fn query_opt(&self, sql: &str, params: &Params) -> DbResult<Option<Record>> {
        let bound = bind_named(sql, params)?;
        let refs = bound.as_refs();
        self.runtime.block_on(async {
            let stream = self
                .client
                .query_raw(bound.sql.as_str(), refs)
                .await
                .map_err(DbError::from_db_error)?;
            pin_mut!(stream);
            // Remaining rows are discarded when the stream is dropped.
            match stream.try_next().await.map_err(DbError::from_db_error)? {
                Some(row) => record_from_row(&row).map(Some),
                None => Ok(None),
            }
        })
    }

    fn execute(&self, sql: &str, params: &Params) -> DbResult<u64> {
        let bound = bind_named(sql, params)?;
        self.runtime
            .block_on(self.client.execute(bound.sql.as_str(), &bound.as_refs()))
            .map_err(DbError::from_db_error)
    }

    fn last_insert_id(&self, table: &str) -> DbResult<Option<i64>> {
        self.runtime.block_on(async {
            let Some(row) = self
                .client
                .query_opt(SERIAL_SEQUENCE_SQL, &[&table])
                .await
                .map_err(DbError::from_db_error)?
            else {
                return Ok(None);
            };
            let sequence: String = row.try_get(0).map_err(DbError::from_db_error)?;

            match self
                .client
                .query_one("select currval($1::text::regclass)", &[&sequence])
                .await
            {
                Ok(row) => row.try_get::<_, i64>(0).map(Some).map_err(DbError::from_db_error),
                // currval() is undefined until this session draws from the sequence.
                Err(e) if e.code() == Some(&SqlState::OBJECT_NOT_IN_PREREQUISITE_STATE) => {
                    Ok(None)
                }
                Err(e) => Err(DbError::from_db_error(e)),
            }
        })
    }
}

impl Connect for PgDriver {
    fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        PgDriver::connect(config)
    }
}
