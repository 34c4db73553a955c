//! HTTP handlers for expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{CategoryTotal, MonthlyTotal, expenses_by_category, month_range},
    database_id::ExpenseId,
    db::lock_connection,
    expense::core::{
        Expense, ExpenseFilter, ExpenseRequest, NewExpense, create_expense, delete_expense,
        get_expense, list_expenses, update_expense,
    },
    extract::{Json, Path, Query},
    money::round_to_cents,
    timezone::get_local_today,
};

/// The state needed to manage expenses.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// One row of the spending breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotalResponse {
    /// The category code, e.g. "food".
    pub category: String,
    /// The human-readable category name, e.g. "Food & Dining".
    pub label: String,
    /// The total spent in the category.
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

impl From<CategoryTotal> for CategoryTotalResponse {
    fn from(category_total: CategoryTotal) -> Self {
        Self {
            category: category_total.category.code().to_owned(),
            label: category_total.category.label().to_owned(),
            total: round_to_cents(category_total.total),
        }
    }
}

/// List the logged in user's expenses, applying the filters in the query string.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_expenses(user_id, &filter, &connection).map(Json)
}

/// Record a new expense for the logged in user.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let new_expense = NewExpense::from_request(&request)?;
    let connection = lock_connection(&state.db_connection)?;

    let expense = create_expense(user_id, &new_expense, &connection)
        .inspect_err(|error| tracing::error!("Could not create expense: {error}"))?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// Get one of the logged in user's expenses.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_expense(expense_id, user_id, &connection).map(Json)
}

/// Replace one of the logged in user's expenses.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
    Json(request): Json<ExpenseRequest>,
) -> Result<Json<Expense>, Error> {
    let new_expense = NewExpense::from_request(&request)?;
    let connection = lock_connection(&state.db_connection)?;

    update_expense(expense_id, user_id, &new_expense, &connection).map(Json)
}

/// Delete one of the logged in user's expenses.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_expense(expense_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// The logged in user's total spending for the current month.
pub async fn expenses_monthly_total_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<MonthlyTotal>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let range = month_range(today);
    let filter = ExpenseFilter {
        date_from: Some(range.start),
        date_to: Some(range.end),
        ..Default::default()
    };
    let connection = lock_connection(&state.db_connection)?;

    let expenses = list_expenses(user_id, &filter, &connection)?;

    Ok(Json(MonthlyTotal::for_month(&expenses, today)))
}

/// The logged in user's all-time spending per category, largest first.
pub async fn expenses_by_category_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<CategoryTotalResponse>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let expenses = list_expenses(user_id, &ExpenseFilter::default(), &connection)?;
    let totals = expenses_by_category(&expenses)
        .into_iter()
        .map(CategoryTotalResponse::from)
        .collect();

    Ok(Json(totals))
}
