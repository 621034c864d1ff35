//! SQL builder.
//!
//! A [`QueryBuilder`] collects a table, projection, joins, WHERE fragments,
//! GROUP BY, ORDER BY, LIMIT and OFFSET plus one named-parameter map, then
//! renders select, insert, update or delete statements from that state.
//!
//! ```ignore
//! let page = conn
//!     .table("users")
//!     .select(["id", "name"])
//!     .and_where("active = :active", params! { "active" => true })
//!     .order_by_desc("id")
//!     .paginate(20, 1u64)?;
//! ```

mod clause;
mod exec;
mod query;
mod render;

#[cfg(test)]
mod tests;

pub use clause::{BoolOp, JoinKind, Raw, SortDir};
pub use query::QueryBuilder;
