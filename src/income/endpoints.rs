//! HTTP handlers for income records.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{MonthlyTotal, month_range},
    database_id::IncomeId,
    db::lock_connection,
    extract::{Json, Path, Query},
    income::core::{
        Income, IncomeFilter, IncomeRequest, NewIncome, create_income, delete_income, get_income,
        list_income, update_income,
    },
    timezone::get_local_today,
};

/// The state needed to manage income records.
#[derive(Debug, Clone)]
pub struct IncomeState {
    /// The database connection for managing income.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for IncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// List the logged in user's income, applying the filters in the query string.
pub async fn list_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    Query(filter): Query<IncomeFilter>,
) -> Result<Json<Vec<Income>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_income(user_id, &filter, &connection).map(Json)
}

/// Record a new income for the logged in user.
pub async fn create_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<IncomeRequest>,
) -> Result<(StatusCode, Json<Income>), Error> {
    let today = get_local_today(&state.local_timezone)?;
    let new_income = NewIncome::from_request(&request, today)?;
    let connection = lock_connection(&state.db_connection)?;

    let income = create_income(user_id, &new_income, &connection)
        .inspect_err(|error| tracing::error!("Could not create income: {error}"))?;

    Ok((StatusCode::CREATED, Json(income)))
}

/// Get one of the logged in user's income records.
pub async fn get_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<IncomeId>,
) -> Result<Json<Income>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_income(income_id, user_id, &connection).map(Json)
}

/// Replace one of the logged in user's income records.
pub async fn update_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<IncomeId>,
    Json(request): Json<IncomeRequest>,
) -> Result<Json<Income>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let new_income = NewIncome::from_request(&request, today)?;
    let connection = lock_connection(&state.db_connection)?;

    update_income(income_id, user_id, &new_income, &connection).map(Json)
}

/// Delete one of the logged in user's income records.
pub async fn delete_income_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<IncomeId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_income(income_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// The logged in user's total income for the current month.
pub async fn income_monthly_total_endpoint(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<MonthlyTotal>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let range = month_range(today);
    let filter = IncomeFilter {
        date_from: Some(range.start),
        date_to: Some(range.end),
        ..Default::default()
    };
    let connection = lock_connection(&state.db_connection)?;

    let income = list_income(user_id, &filter, &connection)?;

    Ok(Json(MonthlyTotal::for_month(&income, today)))
}
