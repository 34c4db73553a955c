//! Query-string filters for listing income and expenses, and the SQL they
//! translate to.
//!
//! Every query built here starts with the owner predicate, so a listing can
//! never return another user's records.

use rusqlite::types::Value;
use serde::Deserialize;
use time::Date;

use crate::auth::UserID;

/// Date filters shared by the income and expense listings.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct DateFilter {
    /// Only include records on or after this date.
    pub date_from: Option<Date>,
    /// Only include records on or before this date.
    pub date_to: Option<Date>,
    /// Only include records from this calendar year.
    pub year: Option<i32>,
    /// Only include records from this month (1-12) of any year.
    pub month: Option<u8>,
}

/// A SQL `WHERE` clause and its positional parameters.
#[derive(Debug)]
pub(crate) struct WhereClause {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl WhereClause {
    /// Start a clause that only matches rows owned by `user_id`.
    pub(crate) fn for_user(user_id: UserID) -> Self {
        Self {
            conditions: vec!["user_id = ?".to_owned()],
            params: vec![Value::Integer(user_id.as_i64())],
        }
    }

    /// Add a condition with a single `?` placeholder.
    pub(crate) fn push(&mut self, condition: &str, param: Value) {
        self.conditions.push(condition.to_owned());
        self.params.push(param);
    }

    /// Add the conditions for each date filter that is set.
    pub(crate) fn push_date_filter(&mut self, filter: &DateFilter) {
        if let Some(date_from) = filter.date_from {
            self.push("date >= ?", Value::Text(date_from.to_string()));
        }

        if let Some(date_to) = filter.date_to {
            self.push("date <= ?", Value::Text(date_to.to_string()));
        }

        if let Some(year) = filter.year {
            self.push("strftime('%Y', date) = ?", Value::Text(format!("{year:04}")));
        }

        if let Some(month) = filter.month {
            self.push("strftime('%m', date) = ?", Value::Text(format!("{month:02}")));
        }
    }

    /// Add a case-insensitive substring match on `column`.
    pub(crate) fn push_contains(&mut self, column: &str, text: &str) {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");

        self.push(
            &format!("{column} LIKE ? ESCAPE '\\'"),
            Value::Text(format!("%{escaped}%")),
        );
    }

    /// The clause as SQL, starting with `WHERE`.
    pub(crate) fn sql(&self) -> String {
        format!("WHERE {}", self.conditions.join(" AND "))
    }

    pub(crate) fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Build an `ORDER BY` clause from an `ordering` query parameter such as "-date".
///
/// `allowed` maps the names a client may order by to the SQL expression used
/// for them. Unknown names fall back to newest first.
pub(crate) fn order_by_clause(ordering: Option<&str>, allowed: &[(&str, &str)]) -> String {
    const DEFAULT_ORDER: &str = "ORDER BY date DESC, created_at DESC, id DESC";

    let Some(ordering) = ordering.map(str::trim).filter(|ordering| !ordering.is_empty()) else {
        return DEFAULT_ORDER.to_owned();
    };

    let (name, direction) = match ordering.strip_prefix('-') {
        Some(name) => (name, "DESC"),
        None => (ordering, "ASC"),
    };

    match allowed.iter().find(|(allowed_name, _)| *allowed_name == name) {
        Some((_, expression)) => {
            format!("ORDER BY {expression} {direction}, created_at DESC, id DESC")
        }
        None => {
            tracing::debug!("Ignoring unknown ordering field \"{name}\"");
            DEFAULT_ORDER.to_owned()
        }
    }
}
