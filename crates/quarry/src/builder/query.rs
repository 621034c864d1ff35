use super::clause::{BoolOp, Join, JoinKind, OrderClause, Raw, SortDir, WhereClause};
use crate::connection::Connection;
use crate::params::Params;
use crate::record::Record;
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;

/// Fluent query builder bound to a [`Connection`].
///
/// Accumulates clause state and renders it on demand into a select, insert,
/// update or delete statement that shares one named-parameter map. `T` is the
/// row shape results are mapped into ([`Record`] unless changed with
/// [`QueryBuilder::as_instances_of`]).
///
/// Builder methods take and return `self`, so a builder is owned by whoever
/// built it. Clone it to branch.
pub struct QueryBuilder<'c, D, T = Record> {
    pub(super) connection: &'c Connection<D>,
    pub(super) table: Option<Raw>,
    pub(super) columns: Vec<Raw>,
    pub(super) joins: Vec<Join>,
    pub(super) wheres: Vec<WhereClause>,
    pub(super) groups: Vec<Raw>,
    pub(super) orders: Vec<OrderClause>,
    pub(super) limit: Option<u64>,
    pub(super) offset: Option<u64>,
    pub(super) params: Params,
    pub(super) shape: PhantomData<fn() -> T>,
}

fn star() -> Vec<Raw> {
    vec![Raw::from("*")]
}

impl<'c, D> QueryBuilder<'c, D, Record> {
    /// Create an empty builder (no table, `select *`).
    pub fn new(connection: &'c Connection<D>) -> Self {
        Self {
            connection,
            table: None,
            columns: star(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            params: Params::new(),
            shape: PhantomData,
        }
    }
}

impl<'c, D, T> QueryBuilder<'c, D, T> {
    /// Set the table. The name is not validated.
    pub fn from(mut self, table: impl Into<Raw>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the projected columns, replacing the previous projection.
    ///
    /// An empty list selects `*`.
    pub fn select<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Raw>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        if self.columns.is_empty() {
            self.columns = star();
        }
        self
    }

    /// Add a WHERE fragment joined with `joiner`, and merge its parameters.
    ///
    /// The joiner of the first fragment is never rendered.
    pub fn where_with(mut self, fragment: impl Into<Raw>, params: Params, joiner: BoolOp) -> Self {
        self.wheres.push(WhereClause {
            joiner,
            fragment: fragment.into(),
        });
        self.params.merge(&params);
        self
    }

    /// Add an `and` WHERE fragment.
    ///
    /// ```ignore
    /// conn.table("users").and_where("age > :age", params! { "age" => 18 })
    /// ```
    pub fn and_where(self, fragment: impl Into<Raw>, params: Params) -> Self {
        self.where_with(fragment, params, BoolOp::And)
    }

    /// Add an `or` WHERE fragment.
    pub fn or_where(self, fragment: impl Into<Raw>, params: Params) -> Self {
        self.where_with(fragment, params, BoolOp::Or)
    }

    /// Bind a value without adding a fragment (for placeholders used in joins).
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Add a join. `fragment` is everything after the `join` keyword.
    pub fn join(mut self, kind: JoinKind, fragment: impl Into<Raw>) -> Self {
        self.joins.push(Join {
            kind,
            fragment: fragment.into(),
        });
        self
    }

    /// Add an INNER JOIN, e.g. `inner_join("posts on posts.user_id = users.id")`.
    pub fn inner_join(self, fragment: impl Into<Raw>) -> Self {
        self.join(JoinKind::Inner, fragment)
    }

    /// Add a LEFT JOIN.
    pub fn left_join(self, fragment: impl Into<Raw>) -> Self {
        self.join(JoinKind::Left, fragment)
    }

    /// Add a CROSS JOIN.
    pub fn cross_join(self, fragment: impl Into<Raw>) -> Self {
        self.join(JoinKind::Cross, fragment)
    }

    pub fn order_by(mut self, column: impl Into<Raw>, dir: SortDir) -> Self {
        self.orders.push(OrderClause {
            column: column.into(),
            dir,
        });
        self
    }

    pub fn order_by_asc(self, column: impl Into<Raw>) -> Self {
        self.order_by(column, SortDir::Asc)
    }

    pub fn order_by_desc(self, column: impl Into<Raw>) -> Self {
        self.order_by(column, SortDir::Desc)
    }

    pub fn group_by(mut self, column: impl Into<Raw>) -> Self {
        self.groups.push(column.into());
        self
    }

    /// Set LIMIT. Zero is rendered as no limit at all.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET. Zero is not rendered.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Map result rows into `U` instead of the current shape.
    pub fn as_instances_of<U>(self) -> QueryBuilder<'c, D, U> {
        QueryBuilder {
            connection: self.connection,
            table: self.table,
            columns: self.columns,
            joins: self.joins,
            wheres: self.wheres,
            groups: self.groups,
            orders: self.orders,
            limit: self.limit,
            offset: self.offset,
            params: self.params,
            shape: PhantomData,
        }
    }

    /// An independent copy for counting rows.
    ///
    /// Keeps the table, joins, WHERE fragments, GROUP BY and parameters; resets
    /// the projection to `*` and drops ORDER BY, LIMIT and OFFSET.
    pub fn clone_for_count(&self) -> Self {
        let mut clone = self.clone();
        clone.columns = star();
        clone.orders.clear();
        clone.limit = None;
        clone.offset = None;
        clone
    }

    pub fn connection(&self) -> &'c Connection<D> {
        self.connection
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_ref().map(Raw::as_str)
    }

    /// Parameters bound so far.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The parameters `update(attributes)` executes with.
    ///
    /// The current parameters merged with `attributes`; an attribute wins
    /// over a WHERE parameter of the same name. This is deliberate
    /// last-write-wins behavior, so avoid naming WHERE placeholders after
    /// columns you update.
    pub fn update_params(&self, attributes: &Params) -> Params {
        let mut params = self.params.clone();
        params.merge(attributes);
        params
    }
}

impl<D, T> Clone for QueryBuilder<'_, D, T> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection,
            table: self.table.clone(),
            columns: self.columns.clone(),
            joins: self.joins.clone(),
            wheres: self.wheres.clone(),
            groups: self.groups.clone(),
            orders: self.orders.clone(),
            limit: self.limit,
            offset: self.offset,
            params: self.params.clone(),
            shape: PhantomData,
        }
    }
}

impl<D, T> fmt::Debug for QueryBuilder<'_, D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("joins", &self.joins)
            .field("wheres", &self.wheres)
            .field("groups", &self.groups)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("params", &self.params)
            .field("shape", &std::any::type_name::<T>())
            .finish()
    }
}
