use super::query::QueryBuilder;
use super::render::COUNT_ALIAS;
use crate::driver::Driver;
use crate::error::{DbError, DbResult};
use crate::paginator::{PageRequest, Paginator};
use crate::params::Params;
use crate::record::{FromRow, Record};

impl<D: Driver, T: FromRow> QueryBuilder<'_, D, T> {
    fn require_table(&self) -> DbResult<()> {
        match self.table_name() {
            Some(table) if !table.trim().is_empty() => Ok(()),
            _ => Err(DbError::validation("query has no table")),
        }
    }

    /// Run the select and map every row to `T`.
    pub fn get(&self) -> DbResult<Vec<T>> {
        self.require_table()?;
        self.connection.select(&self.to_sql(), &self.params)
    }

    /// Run the select and map the first row, if any.
    ///
    /// Does not add a LIMIT; the driver stops after the first row.
    pub fn first(&self) -> DbResult<Option<T>> {
        self.require_table()?;
        self.connection.select_one(&self.to_sql(), &self.params)
    }

    /// Insert one row built from `attributes`.
    ///
    /// Only the attributes are bound; WHERE parameters play no part.
    pub fn insert(&self, attributes: &Params) -> DbResult<bool> {
        self.require_table()?;
        require_attributes("insert", attributes)?;
        self.connection.insert(&self.insert_sql(attributes), attributes)
    }

    /// Insert one row and return the id the database generated for it.
    ///
    /// Fails with [`DbError::NoInsertId`] when the table has no
    /// auto-increment key or the insert supplied the key itself.
    pub fn insert_get_id(&self, attributes: &Params) -> DbResult<i64> {
        self.insert(attributes)?;
        self.connection.last_insert_id(self.table_name().unwrap_or_default())
    }

    /// Update the rows matched by the WHERE fragments.
    ///
    /// Binds [`QueryBuilder::update_params`]. With no WHERE fragments every
    /// row is updated.
    pub fn update(&self, attributes: &Params) -> DbResult<bool> {
        self.require_table()?;
        require_attributes("update", attributes)?;
        self.connection
            .update(&self.update_sql(attributes), &self.update_params(attributes))
    }

    /// Delete the rows matched by the WHERE fragments.
    pub fn delete(&self) -> DbResult<bool> {
        self.require_table()?;
        self.connection.delete(&self.delete_sql(), &self.params)
    }

    /// Count matching rows.
    ///
    /// Without GROUP BY this is the aggregate over all matching rows. With
    /// GROUP BY the aggregate is per group, so the result is the number of
    /// groups. The builder is left untouched.
    pub fn count(&self) -> DbResult<u64> {
        self.require_table()?;
        let rows: Vec<Record> = self.connection.select(&self.count_sql(), &self.params)?;
        if !self.groups.is_empty() {
            return Ok(rows.len() as u64);
        }
        match rows.first() {
            Some(row) => row.try_get(COUNT_ALIAS),
            None => Ok(0),
        }
    }

    /// Fetch one page of results plus the total row count.
    ///
    /// Sets LIMIT `per_page` and OFFSET `(page - 1) * per_page`, runs the
    /// select, then counts on [`QueryBuilder::clone_for_count`]. `per_page`
    /// must be positive.
    pub fn paginate(self, per_page: u64, page: impl Into<PageRequest>) -> DbResult<Paginator<T>> {
        if per_page == 0 {
            return Err(DbError::validation("per_page must be greater than zero"));
        }
        let request = page.into();
        let current = request.page().max(1);
        let offset = per_page.saturating_mul(current - 1);

        let query = self.limit(per_page).offset(offset);
        let items = query.get()?;
        let total = query.clone_for_count().count()?;

        tracing::debug!(
            target: "quarry.sql",
            per_page,
            page = current,
            total,
            "paginated query"
        );

        Ok(Paginator::new(
            items,
            total,
            per_page,
            current,
            request.page_name().to_string(),
        ))
    }
}

fn require_attributes(op: &str, attributes: &Params) -> DbResult<()> {
    if attributes.is_empty() {
        return Err(DbError::validation(format!("{op} requires at least one attribute")));
    }
    Ok(())
}
