//! Clause vocabulary: raw fragments, joiners, join kinds and sort directions.

use crate::error::{DbError, DbResult};
use std::fmt;
use std::str::FromStr;

/// A caller-trusted SQL fragment.
///
/// Tables, columns, WHERE/JOIN fragments and GROUP/ORDER expressions are all
/// `Raw`: they are interpolated into the statement verbatim and are **never**
/// escaped. Never build a `Raw` from untrusted input. Values that come from
/// users belong in [`Params`](crate::Params), where the driver binds them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raw(String);

impl Raw {
    pub fn new(sql: impl Into<String>) -> Self {
        Raw(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Raw {
    fn from(sql: &str) -> Self {
        Raw(sql.to_string())
    }
}

impl From<String> for Raw {
    fn from(sql: String) -> Self {
        Raw(sql)
    }
}

impl From<&String> for Raw {
    fn from(sql: &String) -> Self {
        Raw(sql.clone())
    }
}

impl AsRef<str> for Raw {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyword joining a WHERE fragment to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Cross => "cross",
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl FromStr for SortDir {
    type Err = DbError;

    /// Parse `asc`/`desc` in any case.
    fn from_str(s: &str) -> DbResult<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDir::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDir::Desc)
        } else {
            Err(DbError::validation(format!(
                "invalid sort direction '{s}', expected 'asc' or 'desc'"
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WhereClause {
    pub(crate) joiner: BoolOp,
    pub(crate) fragment: Raw,
}

#[derive(Debug, Clone)]
pub(crate) struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) fragment: Raw,
}

#[derive(Debug, Clone)]
pub(crate) struct OrderClause {
    pub(crate) column: Raw,
    pub(crate) dir: SortDir,
}
