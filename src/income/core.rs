//! Defines the core data models and database queries for income.

use rusqlite::{Connection, Row, params_from_iter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    dashboard::Entry,
    database_id::IncomeId,
    fields::{optional_text, parse_date, required_text},
    filters::{DateFilter, WhereClause, order_by_clause},
    label::Label,
    money::{decimal_from_row, parse_decimal, to_sql_text, validate_amount},
};

// ============================================================================
// MODELS
// ============================================================================

/// Money earned by a user, e.g. a salary payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Income {
    /// The ID of the income record.
    pub id: IncomeId,
    /// Where the money came from.
    pub source: Label,
    /// The amount of money earned.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// When the money was earned.
    pub date: Date,
    /// Free-text notes, may be empty.
    pub notes: String,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Entry for Income {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn date(&self) -> Date {
        self.date
    }
}

/// The validated fields for creating or replacing an income record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncome {
    /// Where the money came from.
    pub source: Label,
    /// The amount of money earned, greater than zero.
    pub amount: Decimal,
    /// When the money was earned, no later than today.
    pub date: Date,
    /// Free-text notes, may be empty.
    pub notes: String,
}

impl NewIncome {
    /// Validate the fields of a new income record.
    ///
    /// `today` is the current date in the server's local timezone.
    ///
    /// # Errors
    /// Returns an:
    /// - [Error::InvalidField] if `source` is blank or too long, or `amount` is not a positive
    ///   amount of money,
    /// - or [Error::FutureDate] if `date` is after `today`.
    pub fn new(
        source: &str,
        amount: Decimal,
        date: Date,
        notes: &str,
        today: Date,
    ) -> Result<Self, Error> {
        let source = Label::new("source", source)?;
        let amount = validate_amount("amount", amount)?;

        if date > today {
            return Err(Error::FutureDate(date));
        }

        Ok(Self {
            source,
            amount,
            date,
            notes: notes.to_owned(),
        })
    }

    /// Validate the raw fields of a JSON request body.
    ///
    /// # Errors
    /// Returns an error if a field is missing or invalid, see [NewIncome::new].
    pub fn from_request(request: &IncomeRequest, today: Date) -> Result<Self, Error> {
        let source = required_text("source", request.source.as_ref())?;
        let amount = parse_decimal("amount", request.amount.as_ref())?;
        let date = parse_date("date", request.date.as_ref())?;
        let notes = optional_text("notes", request.notes.as_ref())?;

        Self::new(&source, amount, date, &notes, today)
    }
}

/// The raw JSON body of a create or update request.
///
/// Fields are kept as JSON values so that validation can report which field
/// is wrong instead of rejecting the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct IncomeRequest {
    #[serde(default)]
    source: Option<Value>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
}

/// Query parameters for listing income.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IncomeFilter {
    /// Only include income on or after this date.
    pub date_from: Option<Date>,
    /// Only include income on or before this date.
    pub date_to: Option<Date>,
    /// Only include income from this calendar year.
    pub year: Option<i32>,
    /// Only include income from this month (1-12).
    pub month: Option<u8>,
    /// Only include income whose source contains this text, ignoring case.
    pub source: Option<String>,
    /// The field to sort by, e.g. "amount" or "-date" for descending.
    pub ordering: Option<String>,
}

impl IncomeFilter {
    fn date_filter(&self) -> DateFilter {
        DateFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            year: self.year,
            month: self.month,
        }
    }
}

const ORDERING_FIELDS: [(&str, &str); 3] = [
    ("date", "date"),
    ("amount", "CAST(amount AS REAL)"),
    ("created_at", "created_at"),
];

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const COLUMNS: &str = "id, source, amount, date, notes, created_at, updated_at";

/// Create a new income record for `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn create_income(
    user_id: UserID,
    income: &NewIncome,
    connection: &Connection,
) -> Result<Income, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO income (user_id, source, amount, date, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                income.source.as_ref(),
                to_sql_text(income.amount),
                income.date,
                &income.notes,
                now,
            ),
            map_income_row,
        )
        .map_err(Error::from)
}

/// Retrieve the income record `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income record owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_income(id: IncomeId, user_id: UserID, connection: &Connection) -> Result<Income, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM income WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_income_row,
        )
        .map_err(Error::from)
}

/// Replace the fields of the income record `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income record owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_income(
    id: IncomeId,
    user_id: UserID,
    income: &NewIncome,
    connection: &Connection,
) -> Result<Income, Error> {
    connection
        .prepare(&format!(
            "UPDATE income
             SET source = ?1, amount = ?2, date = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                income.source.as_ref(),
                to_sql_text(income.amount),
                income.date,
                &income.notes,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_income_row,
        )
        .map_err(Error::from)
}

/// Delete the income record `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income record owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_income(id: IncomeId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// List the income records owned by `user_id` that match `filter`.
///
/// Records are sorted newest first unless `filter` asks for another order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_income(
    user_id: UserID,
    filter: &IncomeFilter,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    let mut clause = WhereClause::for_user(user_id);
    clause.push_date_filter(&filter.date_filter());

    if let Some(source) = filter.source.as_deref().filter(|source| !source.is_empty()) {
        clause.push_contains("source", source);
    }

    let order_by = order_by_clause(filter.ordering.as_deref(), &ORDERING_FIELDS);

    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM income {} {order_by}",
            clause.sql()
        ))?
        .query_map(params_from_iter(clause.params()), map_income_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Create the income table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS income (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                source TEXT NOT NULL,
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
        "CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Income].
fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    let source: String = row.get(1)?;

    Ok(Income {
        id: row.get(0)?,
        source: Label::new_unchecked(&source),
        amount: decimal_from_row(row, 2)?,
        date: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod new_income_tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        income::{IncomeRequest, NewIncome},
    };

    const TODAY: time::Date = date!(2024 - 06 - 15);

    #[test]
    fn accepts_today() {
        let income = NewIncome::new("Salary", dec!(3000.00), TODAY, "", TODAY).unwrap();

        assert_eq!(income.source.as_ref(), "Salary");
        assert_eq!(income.amount, dec!(3000.00));
    }

    #[test]
    fn rejects_future_date() {
        let tomorrow = date!(2024 - 06 - 16);

        assert_eq!(
            NewIncome::new("Salary", dec!(3000.00), tomorrow, "", TODAY),
            Err(Error::FutureDate(tomorrow))
        );
    }

    #[test]
    fn rejects_non_positive_amount() {
        assert_eq!(
            NewIncome::new("Salary", dec!(0), TODAY, "", TODAY),
            Err(Error::InvalidField {
                field: "amount",
                message: "Amount must be greater than zero.".to_owned()
            })
        );
    }

    #[test]
    fn rejects_blank_source() {
        assert!(matches!(
            NewIncome::new("   ", dec!(1), TODAY, "", TODAY),
            Err(Error::InvalidField {
                field: "source",
                ..
            })
        ));
    }

    #[test]
    fn parses_request_body() {
        let request: IncomeRequest = serde_json::from_value(json!({
            "source": "Freelance",
            "amount": "450.50",
            "date": "2024-06-01"
        }))
        .unwrap();

        let income = NewIncome::from_request(&request, TODAY).unwrap();

        assert_eq!(
            income,
            NewIncome::new("Freelance", dec!(450.50), date!(2024 - 06 - 01), "", TODAY).unwrap()
        );
    }

    #[test]
    fn request_without_amount_is_rejected() {
        let request: IncomeRequest = serde_json::from_value(json!({
            "source": "Freelance",
            "date": "2024-06-01"
        }))
        .unwrap();

        assert_eq!(
            NewIncome::from_request(&request, TODAY),
            Err(Error::InvalidField {
                field: "amount",
                message: "This field is required.".to_owned()
            })
        );
    }
}
