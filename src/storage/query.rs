//! Optional list filters composed onto a `sqlx::QueryBuilder`.
//!
//! The same predicate set is pushed onto the `COUNT(*)` query and the page
//! query so totals and items always agree.

use sqlx::{QueryBuilder, Sqlite};

use crate::domain::ListParams;

#[derive(Debug, Default, Clone)]
pub(crate) struct Predicates {
    search: Option<(Vec<&'static str>, String)>,
    flags: Vec<(&'static str, bool)>,
    ids: Vec<(&'static str, i64)>,
}

impl Predicates {
    /// Substring match of `pattern` against any of `columns`.
    pub fn search(mut self, columns: &[&'static str], pattern: Option<String>) -> Self {
        if let Some(pattern) = pattern {
            self.search = Some((columns.to_vec(), pattern));
        }
        self
    }

    /// Equality on a boolean column, skipped when `value` is `None`.
    pub fn flag(mut self, column: &'static str, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.flags.push((column, value));
        }
        self
    }

    /// Equality on an id column.
    pub fn id(mut self, column: &'static str, value: i64) -> Self {
        self.ids.push((column, value));
        self
    }

    /// Append `AND ...` clauses. The builder must already contain a `WHERE`.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (column, value) in &self.ids {
            qb.push(" AND ").push(*column).push(" = ").push_bind(*value);
        }

        if let Some((columns, pattern)) = &self.search {
            qb.push(" AND (");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" LIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }

        for (column, value) in &self.flags {
            qb.push(" AND ").push(*column).push(" = ").push_bind(*value);
        }
    }
}

/// Append `LIMIT`/`OFFSET` for the requested page.
pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, params: &ListParams) {
    qb.push(" LIMIT ")
        .push_bind(params.limit())
        .push(" OFFSET ")
        .push_bind(params.offset());
}
