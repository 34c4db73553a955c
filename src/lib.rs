//! Finance Tracker is a JSON API for tracking personal income, expenses and
//! savings goals.
//!
//! Authenticated users record transactions and savings goals, and the
//! dashboard turns those records into totals, category breakdowns, a
//! six month trend and goal progress indicators.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::{Map, Value, json};
use time::Date;
use tokio::signal;

mod app_state;
mod auth;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod extract;
mod fields;
mod filters;
mod goal;
mod income;
mod label;
mod logging;
mod money;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use db::initialize as initialize_db;
pub use expense::{Category, NewExpense, create_expense};
pub use goal::{NewSavingsGoal, create_goal};
pub use income::{NewIncome, create_income};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username and password did not match a registered user.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid, unexpired auth cookie.
    #[error("authentication credentials were not provided or have expired")]
    NotAuthenticated,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A single field of a request failed validation.
    ///
    /// Rendered to the client as `{"<field>": ["<message>"]}`.
    #[error("{field}: {message}")]
    InvalidField {
        /// The name of the offending field, as it appears in the request.
        field: &'static str,
        /// A human-readable reason.
        message: String,
    },

    /// The request as a whole was rejected, e.g. an add-funds request without
    /// a usable amount.
    ///
    /// Rendered to the client as `{"error": "<message>"}`.
    #[error("{0}")]
    InvalidInput(String),

    /// axum could not extract the request's body, path or query string.
    ///
    /// Rendered to the client as `{"error": "<message>"}` with `status`.
    #[error("request rejected: {message}")]
    RequestRejected {
        /// The status code axum chose for the rejection.
        status: StatusCode,
        /// axum's description of the problem.
        message: String,
    },

    /// A date in the future was used to record an income.
    ///
    /// Income records events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The username is already registered.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported as not found as well.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidField { field, message } => field_error_response(field, &message),
            Error::FutureDate(_) => field_error_response("date", "Date cannot be in the future."),
            Error::TooWeak(reason) => field_error_response("password", &reason),
            Error::DuplicateUsername(_) => {
                field_error_response("username", "A user with that username already exists.")
            }
            Error::InvalidInput(message) => error_response(StatusCode::BAD_REQUEST, &message),
            Error::RequestRejected { status, message } => error_response(status, &message),
            Error::InvalidCredentials => error_response(
                StatusCode::UNAUTHORIZED,
                "No active account found with the given credentials.",
            ),
            Error::NotAuthenticated => error_response(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            Error::NotFound => error_response(StatusCode::NOT_FOUND, "Not found."),
            Error::InvalidTimezoneError(timezone) => {
                tracing::error!("Could not get local timezone \"{timezone}\"");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid timezone settings. Check that the server timezone is a valid, canonical timezone string.",
                )
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn field_error_response(field: &str, message: &str) -> Response {
    let mut body = Map::new();
    body.insert(field.to_owned(), json!([message]));

    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
}
