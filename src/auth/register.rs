//! Handler for creating new user accounts.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, ValidatedPassword, create_user},
    db::lock_connection,
    extract::Json,
};

#[cfg(not(test))]
const PASSWORD_HASH_COST: u32 = PasswordHash::DEFAULT_COST;
#[cfg(test)]
const PASSWORD_HASH_COST: u32 = 4;

const MAX_USERNAME_LENGTH: usize = 150;

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data sent by a client to register a new account.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterData {
    /// The unique name the user will log in with.
    #[serde(default)]
    pub username: String,
    /// An optional email address.
    #[serde(default)]
    pub email: String,
    /// The new password.
    #[serde(default)]
    pub password: String,
    /// The new password, repeated.
    #[serde(default)]
    pub password2: String,
}

/// The body of a successful registration response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RegisterResponse {
    /// A confirmation message.
    pub message: String,
    /// The name of the created account.
    pub username: String,
}

/// Create a user account.
///
/// # Errors
///
/// Returns a field error if the username is blank or taken, the passwords do
/// not match, or the password is too weak.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(user_data): Json<RegisterData>,
) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    let username = user_data.username.trim();

    if username.is_empty() {
        return Err(Error::InvalidField {
            field: "username",
            message: "This field may not be blank.".to_owned(),
        });
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(Error::InvalidField {
            field: "username",
            message: format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        });
    }

    if user_data.password != user_data.password2 {
        return Err(Error::InvalidField {
            field: "password",
            message: "Passwords do not match.".to_owned(),
        });
    }

    let email = user_data.email.trim();
    let validated_password = ValidatedPassword::new(&user_data.password, &[username, email])?;
    let password_hash = PasswordHash::new(validated_password, PASSWORD_HASH_COST)
        .inspect_err(|error| tracing::error!("an error occurred while hashing a password: {error}"))?;

    let connection = lock_connection(&state.db_connection)?;

    let user = create_user(username, email, password_hash, &connection)?;
    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created successfully.".to_owned(),
            username: user.username,
        }),
    ))
}
