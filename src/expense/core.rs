//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, Row, params_from_iter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    dashboard::{Categorised, Entry},
    database_id::ExpenseId,
    expense::Category,
    fields::{optional_text, parse_date, required_text},
    filters::{DateFilter, WhereClause, order_by_clause},
    label::Label,
    money::{decimal_from_row, parse_decimal, to_sql_text, validate_amount},
};

// ============================================================================
// MODELS
// ============================================================================

/// Money spent by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub title: Label,
    /// The category of the expense.
    pub category: Category,
    /// The amount of money spent.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// Free-text notes, may be empty.
    pub notes: String,
    /// When the record was created.
    pub created_at: OffsetDateTime,
    /// When the record was last changed.
    pub updated_at: OffsetDateTime,
}

impl Serialize for Expense {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let created_at = self
            .created_at
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        let updated_at = self
            .updated_at
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(serde::ser::Error::custom)?;

        let mut state = serializer.serialize_struct("Expense", 9)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("category_display", self.category.label())?;
        state.serialize_field("amount", &self.amount.to_string())?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("notes", &self.notes)?;
        state.serialize_field("created_at", &created_at)?;
        state.serialize_field("updated_at", &updated_at)?;
        state.end()
    }
}

impl Entry for Expense {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn date(&self) -> Date {
        self.date
    }
}

impl Categorised for Expense {
    fn category(&self) -> &Category {
        &self.category
    }
}

/// The validated fields for creating or replacing an expense.
///
/// Unlike income, expenses may be dated in the future, e.g. for a bill that
/// is already known.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// What the money was spent on.
    pub title: Label,
    /// The category of the expense.
    pub category: Category,
    /// The amount of money spent, greater than zero.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// Free-text notes, may be empty.
    pub notes: String,
}

impl NewExpense {
    /// Validate the fields of a new expense.
    ///
    /// # Errors
    /// Returns an [Error::InvalidField] if `title` is blank or too long, or
    /// `amount` is not a positive amount of money.
    pub fn new(
        title: &str,
        category: Category,
        amount: Decimal,
        date: Date,
        notes: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            title: Label::new("title", title)?,
            category,
            amount: validate_amount("amount", amount)?,
            date,
            notes: notes.to_owned(),
        })
    }

    /// Validate the raw fields of a JSON request body.
    ///
    /// A missing category defaults to [Category::Other].
    ///
    /// # Errors
    /// Returns an error if a field is missing or invalid, see [NewExpense::new].
    pub fn from_request(request: &ExpenseRequest) -> Result<Self, Error> {
        let title = required_text("title", request.title.as_ref())?;
        let category = match &request.category {
            None => Category::default(),
            Some(Value::String(code)) => Category::parse(code)?,
            Some(other) => Category::parse(&other.to_string())?,
        };
        let amount = parse_decimal("amount", request.amount.as_ref())?;
        let date = parse_date("date", request.date.as_ref())?;
        let notes = optional_text("notes", request.notes.as_ref())?;

        Self::new(&title, category, amount, date, &notes)
    }
}

/// The raw JSON body of a create or update request.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseRequest {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
}

/// Query parameters for listing expenses.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExpenseFilter {
    /// Only include expenses on or after this date.
    pub date_from: Option<Date>,
    /// Only include expenses on or before this date.
    pub date_to: Option<Date>,
    /// Only include expenses from this calendar year.
    pub year: Option<i32>,
    /// Only include expenses from this month (1-12).
    pub month: Option<u8>,
    /// Only include expenses whose title contains this text, ignoring case.
    pub title: Option<String>,
    /// Only include expenses with this category code.
    pub category: Option<String>,
    /// The field to sort by, e.g. "amount" or "-date" for descending.
    pub ordering: Option<String>,
}

impl ExpenseFilter {
    fn date_filter(&self) -> DateFilter {
        DateFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            year: self.year,
            month: self.month,
        }
    }
}

const ORDERING_FIELDS: [(&str, &str); 4] = [
    ("date", "date"),
    ("amount", "CAST(amount AS REAL)"),
    ("category", "category"),
    ("created_at", "created_at"),
];

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const COLUMNS: &str = "id, title, category, amount, date, notes, created_at, updated_at";

/// Create a new expense for `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn create_expense(
    user_id: UserID,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO expense (user_id, title, category, amount, date, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                expense.title.as_ref(),
                expense.category.code(),
                to_sql_text(expense.amount),
                expense.date,
                &expense.notes,
                OffsetDateTime::now_utc(),
            ),
            map_expense_row,
        )
        .map_err(Error::from)
}

/// Retrieve the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM expense WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_expense_row,
        )
        .map_err(Error::from)
}

/// Replace the fields of the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    user_id: UserID,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "UPDATE expense
             SET title = ?1, category = ?2, amount = ?3, date = ?4, notes = ?5, updated_at = ?6
             WHERE id = ?7 AND user_id = ?8
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                expense.title.as_ref(),
                expense.category.code(),
                to_sql_text(expense.amount),
                expense.date,
                &expense.notes,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_expense_row,
        )
        .map_err(Error::from)
}

/// Delete the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(id: ExpenseId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// List the expenses owned by `user_id` that match `filter`.
///
/// Expenses are sorted newest first unless `filter` asks for another order.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidField] if the category filter is not a known category,
/// - or [Error::SqlError] if there is some SQL error.
pub fn list_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let mut clause = WhereClause::for_user(user_id);
    clause.push_date_filter(&filter.date_filter());

    if let Some(title) = filter.title.as_deref().filter(|title| !title.is_empty()) {
        clause.push_contains("title", title);
    }

    if let Some(code) = filter.category.as_deref().filter(|code| !code.is_empty()) {
        let category = Category::parse(code)?;
        clause.push("category = ?", category.code().to_owned().into());
    }

    let order_by = order_by_clause(filter.ordering.as_deref(), &ORDERING_FIELDS);

    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM expense {} {order_by}",
            clause.sql()
        ))?
        .query_map(params_from_iter(clause.params()), map_expense_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'other',
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let title: String = row.get(1)?;
    let category: String = row.get(2)?;

    Ok(Expense {
        id: row.get(0)?,
        title: Label::new_unchecked(&title),
        category: Category::from_code(&category),
        amount: decimal_from_row(row, 3)?,
        date: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod new_expense_tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        expense::{Category, ExpenseRequest, NewExpense},
    };

    fn request(value: serde_json::Value) -> ExpenseRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn category_defaults_to_other() {
        let expense = NewExpense::from_request(&request(json!({
            "title": "Coffee",
            "amount": "4.50",
            "date": "2024-06-01"
        })))
        .unwrap();

        assert_eq!(expense.category, Category::Other);
        assert_eq!(expense.amount, dec!(4.50));
        assert_eq!(expense.notes, "");
    }

    #[test]
    fn unknown_category_is_rejected() {
        let result = NewExpense::from_request(&request(json!({
            "title": "Dog food",
            "category": "pets",
            "amount": "20.00",
            "date": "2024-06-01"
        })));

        assert_eq!(
            result,
            Err(Error::InvalidField {
                field: "category",
                message: "\"pets\" is not a valid choice.".to_owned()
            })
        );
    }

    #[test]
    fn future_dates_are_allowed() {
        let expense = NewExpense::new(
            "Rent",
            Category::Rent,
            dec!(1200),
            date!(2999 - 01 - 01),
            "",
        );

        assert!(expense.is_ok());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = NewExpense::from_request(&request(json!({
            "title": "Refund",
            "amount": -5,
            "date": "2024-06-01"
        })));

        assert!(matches!(
            result,
            Err(Error::InvalidField {
                field: "amount",
                ..
            })
        ));
    }
}
