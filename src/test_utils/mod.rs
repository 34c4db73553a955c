#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{assert_status, response_json};

use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, UserID, create_user},
    db::initialize,
};

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user named `username` and return their ID.
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> UserID {
    create_user(
        username,
        "",
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
    .id
}
