//! Convenient imports for typical `quarry` usage.
//!
//! ```ignore
//! use quarry::prelude::*;
//! ```

pub use crate::params;
pub use crate::{
    Connection, Database, DatabaseConfig, DbError, DbResult, FromRow, PageRequest, Paginator,
    Params, PgDriver, QueryBuilder, Record, SortDir, Value,
};
