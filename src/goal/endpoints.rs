//! HTTP handlers for savings goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::GoalId,
    db::lock_connection,
    extract::{Json, Path},
    goal::{
        GoalRequest, GoalView, NewSavingsGoal, add_funds, create_goal, delete_goal, get_goal,
        list_goals, update_goal,
    },
    money::parse_contribution,
    timezone::get_local_today,
};

/// The state needed to manage savings goals.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The body of an add-funds request.
#[derive(Debug, Default, Deserialize)]
pub struct AddFundsRequest {
    #[serde(default)]
    amount: Option<Value>,
}

/// List all of the logged in user's savings goals, newest first.
pub async fn list_goals_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<GoalView>>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let goals = list_goals(user_id, &connection)?
        .into_iter()
        .map(|goal| GoalView::new(goal, today))
        .collect();

    Ok(Json(goals))
}

/// Create a savings goal for the logged in user.
pub async fn create_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<GoalRequest>,
) -> Result<(StatusCode, Json<GoalView>), Error> {
    let today = get_local_today(&state.local_timezone)?;
    let new_goal = NewSavingsGoal::from_request(&request, today)?;
    let connection = lock_connection(&state.db_connection)?;

    let goal = create_goal(user_id, &new_goal, &connection)
        .inspect_err(|error| tracing::error!("Could not create savings goal: {error}"))?;

    Ok((StatusCode::CREATED, Json(GoalView::new(goal, today))))
}

/// Get one of the logged in user's savings goals.
pub async fn get_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<GoalView>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let goal = get_goal(goal_id, user_id, &connection)?;

    Ok(Json(GoalView::new(goal, today)))
}

/// Replace one of the logged in user's savings goals.
pub async fn update_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
    Json(request): Json<GoalRequest>,
) -> Result<Json<GoalView>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let new_goal = NewSavingsGoal::from_request(&request, today)?;
    let connection = lock_connection(&state.db_connection)?;

    let goal = update_goal(goal_id, user_id, &new_goal, &connection)?;

    Ok(Json(GoalView::new(goal, today)))
}

/// Delete one of the logged in user's savings goals.
pub async fn delete_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_goal(goal_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Add money to one of the logged in user's savings goals.
///
/// The goal must exist before the amount is checked, so a missing goal is
/// reported as not found even when the amount is also invalid.
pub async fn add_funds_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
    Json(request): Json<AddFundsRequest>,
) -> Result<Json<GoalView>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    get_goal(goal_id, user_id, &connection)?;
    let amount = parse_contribution(request.amount.as_ref())?;

    let goal = add_funds(goal_id, user_id, amount, &connection)
        .inspect_err(|error| tracing::error!("Could not add funds to goal {goal_id}: {error}"))?;

    Ok(Json(GoalView::new(goal, today)))
}
