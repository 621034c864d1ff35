//! # quarry
//!
//! A small blocking SQL query builder with named parameters and pagination.
//!
//! ## Features
//!
//! - **Fluent builder**: table, columns, joins, WHERE fragments, GROUP BY,
//!   ORDER BY, LIMIT and OFFSET rendered into select/insert/update/delete
//! - **Named parameters**: `:name` placeholders bound by the driver, never
//!   interpolated
//! - **Pagination**: one page of rows plus the total, counted on a copy of
//!   the query
//! - **Typed rows**: results come back as [`Record`]s or any [`FromRow`] type
//! - **Pluggable driver**: [`PgDriver`] for PostgreSQL, or any [`Driver`]
//!
//! Raw fragments (tables, columns, conditions, join clauses) are inserted
//! verbatim. Only values passed through [`Params`] are safe for user input.
//!
//! ## Example
//!
//! ```ignore
//! use quarry::prelude::*;
//!
//! let db = Database::<PgDriver>::new(DatabaseConfig::from_env()?);
//!
//! let id = db
//!     .table("users")?
//!     .insert_get_id(&params! { "name" => "alice", "age" => 30 })?;
//!
//! let page = db
//!     .table("users")?
//!     .and_where("age >= :age", params! { "age" => 18 })
//!     .order_by_asc("id")
//!     .paginate(20, PageRequest::from_query("page=2", "page"))?;
//!
//! for user in &page {
//!     println!("{:?}", user.get("name"));
//! }
//! ```

pub mod builder;
pub mod config;
pub mod connection;
pub mod database;
pub mod driver;
pub mod error;
pub mod paginator;
pub mod params;
pub mod placeholder;
pub mod postgres;
pub mod prelude;
pub mod record;
pub mod value;

pub use builder::{BoolOp, JoinKind, QueryBuilder, Raw, SortDir};
pub use config::{DatabaseConfig, DriverOptions};
pub use connection::{Connection, ConnectionOptions, StatementKind};
pub use database::Database;
pub use driver::{Connect, Driver};
pub use error::{DbError, DbResult};
pub use paginator::{PageRequest, Paginator};
pub use params::Params;
pub use placeholder::{BoundSql, bind_named};
pub use postgres::PgDriver;
pub use record::{FromRow, Record};
pub use value::{FromValue, Value};

pub use rust_decimal::Decimal;

// Re-export derive macros
#[cfg(feature = "derive")]
pub use quarry_derive::FromRow;
