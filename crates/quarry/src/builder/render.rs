use super::clause::Raw;
use super::query::QueryBuilder;
use crate::params::Params;

/// Alias of the count column in [`QueryBuilder::count_sql`].
pub(crate) const COUNT_ALIAS: &str = "count";

fn push_joined<'a>(sql: &mut String, parts: impl IntoIterator<Item = &'a str>, sep: &str) {
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(sep);
        }
        sql.push_str(part);
    }
}

impl<D, T> QueryBuilder<'_, D, T> {
    fn table_str(&self) -> &str {
        self.table.as_ref().map_or("", Raw::as_str)
    }

    /// Render the select statement.
    ///
    /// `select <cols> from <table>[ <kind> join <frag>]...[ where ...][ group by ...][ order by ...][ limit n][ offset n]`
    pub fn to_sql(&self) -> String {
        self.render_select(&self.columns)
    }

    /// The aggregate statement [`QueryBuilder::count`] runs.
    pub fn count_sql(&self) -> String {
        self.render_select(&[Raw::new(format!("count(*) {COUNT_ALIAS}"))])
    }

    /// Render an insert for `attributes`, in attribute order.
    ///
    /// `insert into <table> (a, b) values (:a, :b)`
    pub fn insert_sql(&self, attributes: &Params) -> String {
        let mut sql = format!("insert into {} (", self.table_str());
        push_joined(&mut sql, attributes.keys(), ", ");
        sql.push_str(") values (");
        for (i, key) in attributes.keys().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push(':');
            sql.push_str(key);
        }
        sql.push(')');
        sql
    }

    /// Render an update for `attributes` scoped by the WHERE fragments.
    ///
    /// `update <table> set a = :a, b = :b[ where ...]...`
    pub fn update_sql(&self, attributes: &Params) -> String {
        let mut sql = format!("update {} set ", self.table_str());
        for (i, key) in attributes.keys().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(key);
            sql.push_str(" = :");
            sql.push_str(key);
        }
        self.push_tail(&mut sql);
        sql
    }

    /// Render a delete scoped by the WHERE fragments.
    ///
    /// An empty WHERE list deletes every row.
    pub fn delete_sql(&self) -> String {
        let mut sql = format!("delete from {}", self.table_str());
        self.push_tail(&mut sql);
        sql
    }

    fn render_select(&self, columns: &[Raw]) -> String {
        let mut sql = String::from("select ");
        push_joined(&mut sql, columns.iter().map(Raw::as_str), ", ");
        sql.push_str(" from ");
        sql.push_str(self.table_str());
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_str());
            sql.push_str(" join ");
            sql.push_str(join.fragment.as_str());
        }
        self.push_tail(&mut sql);
        sql
    }

    // where / group by / order by / limit / offset, in that order.
    fn push_tail(&self, sql: &mut String) {
        if !self.wheres.is_empty() {
            sql.push_str(" where");
            for (i, clause) in self.wheres.iter().enumerate() {
                if i > 0 {
                    sql.push(' ');
                    sql.push_str(clause.joiner.as_str());
                }
                sql.push(' ');
                sql.push_str(clause.fragment.as_str());
            }
        }

        if !self.groups.is_empty() {
            sql.push_str(" group by ");
            push_joined(sql, self.groups.iter().map(Raw::as_str), ", ");
        }

        if !self.orders.is_empty() {
            sql.push_str(" order by ");
            for (i, order) in self.orders.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(order.column.as_str());
                sql.push(' ');
                sql.push_str(order.dir.as_str());
            }
        }

        // Zero is indistinguishable from unset.
        if let Some(limit) = self.limit.filter(|&n| n > 0) {
            sql.push_str(" limit ");
            sql.push_str(&limit.to_string());
        }
        if let Some(offset) = self.offset.filter(|&n| n > 0) {
            sql.push_str(" offset ");
            sql.push_str(&offset.to_string());
        }
    }
}
