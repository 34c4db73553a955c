//! Defines the savings goal model and its database queries.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::GoalId,
    fields::{parse_date, required_text},
    label::Label,
    money::{decimal_from_row, parse_decimal, require_positive, to_sql_text, validate_precision},
};

// ============================================================================
// MODELS
// ============================================================================

/// An amount of money a user wants to have saved by a deadline.
///
/// The current amount is tracked by hand and is not derived from the user's
/// income or expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The name of the goal, e.g. "New car".
    pub name: Label,
    /// The amount of money to save.
    #[serde(with = "rust_decimal::serde::str")]
    pub target_amount: Decimal,
    /// The amount of money saved so far.
    #[serde(with = "rust_decimal::serde::str")]
    pub current_amount: Decimal,
    /// The date the money should be saved by.
    pub deadline: Date,
    /// When the goal was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the goal was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SavingsGoal {
    /// The UTC calendar date the goal was created on.
    pub fn created_on(&self) -> Date {
        self.created_at.date()
    }
}

/// The validated fields for creating or replacing a savings goal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavingsGoal {
    /// The name of the goal.
    pub name: Label,
    /// The amount of money to save, greater than zero.
    pub target_amount: Decimal,
    /// The amount of money saved so far, zero or more.
    pub current_amount: Decimal,
    /// The date the money should be saved by, after today.
    pub deadline: Date,
}

impl NewSavingsGoal {
    /// Validate the fields of a savings goal.
    ///
    /// `today` is the current date in the server's local timezone.
    ///
    /// # Errors
    /// Returns an [Error::InvalidField] if `name` is blank or too long,
    /// `target_amount` is not positive, `current_amount` is negative, either
    /// amount does not fit two decimal places, or `deadline` is not after `today`.
    pub fn new(
        name: &str,
        target_amount: Decimal,
        current_amount: Decimal,
        deadline: Date,
        today: Date,
    ) -> Result<Self, Error> {
        let name = Label::new("name", name)?;
        let target_amount = require_positive(
            "target_amount",
            validate_precision("target_amount", target_amount)?,
            "Target amount must be greater than zero.",
        )?;
        let current_amount = validate_precision("current_amount", current_amount)?;

        if current_amount < Decimal::ZERO {
            return Err(Error::InvalidField {
                field: "current_amount",
                message: "Ensure this value is greater than or equal to 0.00.".to_owned(),
            });
        }

        if deadline <= today {
            return Err(Error::InvalidField {
                field: "deadline",
                message: "Deadline must be a future date.".to_owned(),
            });
        }

        Ok(Self {
            name,
            target_amount,
            current_amount,
            deadline,
        })
    }

    /// Validate the raw fields of a JSON request body.
    ///
    /// A missing or null `current_amount` defaults to zero.
    ///
    /// # Errors
    /// Returns an error if a field is missing or invalid, see [NewSavingsGoal::new].
    pub fn from_request(request: &GoalRequest, today: Date) -> Result<Self, Error> {
        let name = required_text("name", request.name.as_ref())?;
        let target_amount = parse_decimal("target_amount", request.target_amount.as_ref())?;
        let current_amount = match &request.current_amount {
            None | Some(Value::Null) => Decimal::ZERO,
            raw => parse_decimal("current_amount", raw.as_ref())?,
        };
        let deadline = parse_date("deadline", request.deadline.as_ref())?;

        Self::new(&name, target_amount, current_amount, deadline, today)
    }
}

/// The raw JSON body of a create or update request.
#[derive(Debug, Default, Deserialize)]
pub struct GoalRequest {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    target_amount: Option<Value>,
    #[serde(default)]
    current_amount: Option<Value>,
    #[serde(default)]
    deadline: Option<Value>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const COLUMNS: &str = "id, name, target_amount, current_amount, deadline, created_at, updated_at";

/// Create a new savings goal for `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn create_goal(
    user_id: UserID,
    goal: &NewSavingsGoal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    create_goal_at(user_id, goal, OffsetDateTime::now_utc(), connection)
}

/// Create a new savings goal for `user_id` with an explicit creation time.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub(crate) fn create_goal_at(
    user_id: UserID,
    goal: &NewSavingsGoal,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO savings_goal (user_id, name, target_amount, current_amount, deadline, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                goal.name.as_ref(),
                to_sql_text(goal.target_amount),
                to_sql_text(goal.current_amount),
                goal.deadline,
                created_at,
            ),
            map_goal_row,
        )
        .map_err(Error::from)
}

/// Retrieve the savings goal `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_goal(id: GoalId, user_id: UserID, connection: &Connection) -> Result<SavingsGoal, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM savings_goal WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_goal_row,
        )
        .map_err(Error::from)
}

/// Replace the fields of the savings goal `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_goal(
    id: GoalId,
    user_id: UserID,
    goal: &NewSavingsGoal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection
        .prepare(&format!(
            "UPDATE savings_goal
             SET name = ?1, target_amount = ?2, current_amount = ?3, deadline = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                goal.name.as_ref(),
                to_sql_text(goal.target_amount),
                to_sql_text(goal.current_amount),
                goal.deadline,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_goal_row,
        )
        .map_err(Error::from)
}

/// Delete the savings goal `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_goal(id: GoalId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// List every savings goal owned by `user_id`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_goals(user_id: UserID, connection: &Connection) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM savings_goal WHERE user_id = :user_id
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_goal_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Add `amount` to the current amount of the savings goal `id` owned by `user_id`.
///
/// The read and the write happen in one `IMMEDIATE` transaction, so
/// concurrent contributions to the same goal are applied one after the other.
/// `amount` should already have been checked with
/// [crate::money::parse_contribution].
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - [Error::InvalidInput] if the new total does not fit in an amount,
/// - or [Error::SqlError] there is some other SQL error.
pub fn add_funds(
    id: GoalId,
    user_id: UserID,
    amount: Decimal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let current_amount = transaction
        .prepare("SELECT current_amount FROM savings_goal WHERE id = ?1 AND user_id = ?2")?
        .query_row((id, user_id.as_i64()), |row| decimal_from_row(row, 0))?;

    let new_amount = current_amount + amount;
    validate_precision("current_amount", new_amount)
        .map_err(|_| Error::InvalidInput("The new amount is too large.".to_owned()))?;

    let goal = transaction
        .prepare(&format!(
            "UPDATE savings_goal SET current_amount = ?1, updated_at = ?2
             WHERE id = ?3 AND user_id = ?4
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                to_sql_text(new_amount),
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_goal_row,
        )?;

    transaction.commit()?;

    Ok(goal)
}

/// Create the savings goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                target_amount TEXT NOT NULL,
                current_amount TEXT NOT NULL DEFAULT '0.00',
                deadline TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_savings_goal_user ON savings_goal(user_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [SavingsGoal].
fn map_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    let name: String = row.get(1)?;

    Ok(SavingsGoal {
        id: row.get(0)?,
        name: Label::new_unchecked(&name),
        target_amount: decimal_from_row(row, 2)?,
        current_amount: decimal_from_row(row, 3)?,
        deadline: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod new_goal_tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        goal::{GoalRequest, NewSavingsGoal},
    };

    const TODAY: time::Date = date!(2024 - 01 - 01);

    fn from_json(value: serde_json::Value) -> Result<NewSavingsGoal, Error> {
        let request: GoalRequest = serde_json::from_value(value).unwrap();

        NewSavingsGoal::from_request(&request, TODAY)
    }

    #[test]
    fn current_amount_defaults_to_zero() {
        let goal = from_json(json!({
            "name": "Holiday",
            "target_amount": "2500.00",
            "deadline": "2024-12-01"
        }))
        .unwrap();

        assert_eq!(goal.current_amount, dec!(0));
        assert_eq!(goal.target_amount, dec!(2500));
    }

    #[test]
    fn target_must_be_positive() {
        let result = from_json(json!({
            "name": "Holiday",
            "target_amount": "0",
            "deadline": "2024-12-01"
        }));

        assert_eq!(
            result,
            Err(Error::InvalidField {
                field: "target_amount",
                message: "Target amount must be greater than zero.".to_owned()
            })
        );
    }

    #[test]
    fn current_amount_cannot_be_negative() {
        let result = from_json(json!({
            "name": "Holiday",
            "target_amount": "100",
            "current_amount": "-1",
            "deadline": "2024-12-01"
        }));

        assert!(matches!(
            result,
            Err(Error::InvalidField {
                field: "current_amount",
                ..
            })
        ));
    }

    #[test]
    fn deadline_must_be_after_today() {
        for deadline in ["2024-01-01", "2023-12-31"] {
            let result = from_json(json!({
                "name": "Holiday",
                "target_amount": "100",
                "deadline": deadline
            }));

            assert_eq!(
                result,
                Err(Error::InvalidField {
                    field: "deadline",
                    message: "Deadline must be a future date.".to_owned()
                }),
                "want deadline {deadline} rejected"
            );
        }
    }

    #[test]
    fn deadline_tomorrow_is_accepted() {
        let goal = NewSavingsGoal::new("Car", dec!(100), dec!(0), date!(2024 - 01 - 02), TODAY);

        assert!(goal.is_ok());
    }
}

#[cfg(test)]
mod database_tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
    };

    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        goal::{
            NewSavingsGoal, SavingsGoal, add_funds, create_goal, delete_goal, get_goal,
            list_goals, update_goal,
        },
        money::parse_contribution,
        test_utils::{create_test_user, get_test_connection},
    };

    fn new_goal(name: &str) -> NewSavingsGoal {
        NewSavingsGoal::new(
            name,
            dec!(1000),
            dec!(0),
            date!(2999 - 01 - 01),
            date!(2024 - 01 - 01),
        )
        .unwrap()
    }

    #[test]
    fn create_and_get() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);

        let goal = create_goal(user_id, &new_goal("Car"), &conn).unwrap();

        assert_eq!(goal.current_amount.to_string(), "0.00");
        assert_eq!(goal.target_amount.to_string(), "1000.00");
        assert_eq!(get_goal(goal.id, user_id, &conn), Ok(goal));
    }

    #[test]
    fn other_users_goal_is_not_found() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let goal = create_goal(alice, &new_goal("Car"), &conn).unwrap();

        assert_eq!(get_goal(goal.id, bob, &conn), Err(Error::NotFound));
        assert_eq!(
            update_goal(goal.id, bob, &new_goal("Mine"), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(add_funds(goal.id, bob, dec!(10), &conn), Err(Error::NotFound));
        assert_eq!(delete_goal(goal.id, bob, &conn), Err(Error::NotFound));
        assert_eq!(get_goal(goal.id, alice, &conn), Ok(goal));
    }

    #[test]
    fn list_is_newest_first() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        for name in ["First", "Second", "Third"] {
            create_goal(user_id, &new_goal(name), &conn).unwrap();
        }

        let names: Vec<String> = list_goals(user_id, &conn)
            .unwrap()
            .iter()
            .map(|goal| goal.name.to_string())
            .collect();

        assert_eq!(names, ["Third", "Second", "First"]);
    }

    #[test]
    fn update_replaces_fields() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let goal = create_goal(user_id, &new_goal("Car"), &conn).unwrap();
        let replacement = NewSavingsGoal::new(
            "Boat",
            dec!(5000),
            dec!(250.5),
            date!(2999 - 06 - 01),
            date!(2024 - 01 - 01),
        )
        .unwrap();

        let updated = update_goal(goal.id, user_id, &replacement, &conn).unwrap();

        assert_eq!(updated.name.as_ref(), "Boat");
        assert_eq!(updated.current_amount, dec!(250.50));
        assert_eq!(updated.created_at, goal.created_at);
    }

    #[test]
    fn delete_removes_goal() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let goal = create_goal(user_id, &new_goal("Car"), &conn).unwrap();

        delete_goal(goal.id, user_id, &conn).unwrap();

        assert_eq!(get_goal(goal.id, user_id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn add_funds_increments_current_amount() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let goal = create_goal(user_id, &new_goal("Car"), &conn).unwrap();

        add_funds(goal.id, user_id, dec!(10.10), &conn).unwrap();
        let updated = add_funds(goal.id, user_id, dec!(0.2), &conn).unwrap();

        assert_eq!(updated.current_amount, dec!(10.30));
    }

    #[test]
    fn rejected_contribution_leaves_goal_unchanged() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let goal = create_goal(user_id, &new_goal("Car"), &conn).unwrap();

        for raw in [serde_json::json!("-5"), serde_json::json!("abc")] {
            let result = parse_contribution(Some(&raw))
                .and_then(|amount| add_funds(goal.id, user_id, amount, &conn));

            assert_eq!(
                result,
                Err(Error::InvalidInput(
                    "Amount must be a positive number.".to_owned()
                ))
            );
        }

        assert_eq!(get_goal(goal.id, user_id, &conn).unwrap().current_amount, dec!(0));
    }

    #[test]
    fn add_funds_rejects_total_that_does_not_fit() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let goal = create_goal(user_id, &new_goal("Car"), &conn).unwrap();
        add_funds(goal.id, user_id, dec!(9999999999), &conn).unwrap();

        let result = add_funds(goal.id, user_id, dec!(1), &conn);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(
            get_goal(goal.id, user_id, &conn).unwrap().current_amount,
            dec!(9999999999)
        );
    }

    #[test]
    fn concurrent_add_funds_on_shared_connection() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let goal_id = create_goal(user_id, &new_goal("Car"), &conn).unwrap().id;
        let conn = Arc::new(Mutex::new(conn));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let conn = conn.clone();
                thread::spawn(move || {
                    let conn = conn.lock().unwrap();
                    add_funds(goal_id, user_id, dec!(10), &conn).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let conn = conn.lock().unwrap();
        assert_eq!(get_goal(goal_id, user_id, &conn).unwrap().current_amount, dec!(20));
    }

    #[test]
    fn concurrent_add_funds_on_separate_connections() {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let open = || {
            let conn = Connection::open(db_file.path()).unwrap();
            initialize(&conn).unwrap();
            conn
        };
        let first = open();
        let second = open();
        let user_id = create_test_user("alice", &first);
        let goal: SavingsGoal = create_goal(user_id, &new_goal("Car"), &first).unwrap();
        let goal_id = goal.id;

        let handles: Vec<_> = [first, second]
            .into_iter()
            .map(|conn| {
                thread::spawn(move || {
                    add_funds(goal_id, user_id, dec!(10), &conn).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let conn = open();
        assert_eq!(get_goal(goal_id, user_id, &conn).unwrap().current_amount, dec!(20));
    }
}
