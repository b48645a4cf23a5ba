//! Code for creating the user table, registering users and checking their credentials.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A non-empty name that identifies a user when logging in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a username from `name` exactly as given.
    ///
    /// Log-in compares usernames verbatim, so surrounding whitespace is kept.
    ///
    /// # Errors
    /// Returns [Error::EmptyUsername] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            return Err(Error::EmptyUsername);
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a username without validation.
    ///
    /// The caller should ensure that `name` is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// The password is stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: Username,
    /// The user's password.
    pub password: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Register a new user.
///
/// # Errors
///
/// Returns:
/// - [Error::UsernameTaken] if another user already has `username`; the
///   existing user is left unchanged,
/// - or [Error::SqlError] if some other SQL error occurred.
pub fn register_user(
    username: Username,
    password: &str,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        (username.as_ref(), password),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username,
        password: password.to_owned(),
    })
}

/// Find the user whose username and password both exactly match.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] when the username is unknown or the
/// password is wrong, or [Error::SqlError] if some other SQL error occurred.
pub fn authenticate(username: &str, password: &str, connection: &Connection) -> Result<UserID, Error> {
    connection
        .prepare("SELECT id FROM user WHERE username = ?1 AND password = ?2")?
        .query_row((username, password), |row| row.get(0))
        .optional()?
        .map(UserID::new)
        .ok_or(Error::InvalidCredentials)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let username: String = row.get(1)?;
    let password = row.get(2)?;

    Ok(User {
        id,
        username: Username::new_unchecked(&username),
        password,
    })
}
