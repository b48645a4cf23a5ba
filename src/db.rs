//! Creates the application's SQLite schema.

use rusqlite::Connection;

use crate::{Error, auth::create_user_table, expense::create_expense_table};

/// Create the tables for the domain models if they do not already exist.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_user_table(connection)?;
    create_expense_table(connection)?;

    Ok(())
}
