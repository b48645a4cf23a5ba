//! Defines the core data models and database queries for expenses.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    database_id::{DatabaseId, ExpenseId},
};

// ============================================================================
// MODELS
// ============================================================================

/// The fixed set of labels offered when recording an expense.
///
/// The store itself accepts any category text, so stored expenses are not
/// guaranteed to use one of these labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, eating out, etc.
    Food,
    /// Housing costs.
    Rent,
    /// Transport and trips.
    Travel,
    /// Power, water, internet, etc.
    Utilities,
    /// Anything else.
    Others,
}

impl Category {
    /// Every category, in the order they are shown to the user.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Rent,
        Category::Travel,
        Category::Utilities,
        Category::Others,
    ];

    /// The label as it is stored in the database and shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Rent => "Rent",
            Category::Travel => "Travel",
            Category::Utilities => "Utilities",
            Category::Others => "Others",
        }
    }

    /// Find the category with the exact label `label`.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == label)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money spent by a user on a given day.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// When the money was spent.
    pub date: Date,
    /// The category label, usually one of [Category::ALL].
    pub category: String,
    /// How much was spent.
    pub amount: f64,
    /// What the money was spent on.
    pub description: Option<String>,
    /// The user that recorded and owns this expense.
    pub user_id: UserID,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(date: Date, category: &str, amount: f64) -> ExpenseBuilder {
        ExpenseBuilder {
            date,
            category: category.to_owned(),
            amount,
            description: None,
        }
    }
}

/// A builder for creating [Expense] instances.
///
/// The owner is supplied when the expense is inserted with [create_expense].
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::expense::{Category, Expense};
///
/// let lunch = Expense::build(date!(2024-03-01), Category::Food.as_str(), 42.5)
///     .description(Some("lunch"));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct ExpenseBuilder {
    /// The date when the money was spent.
    pub date: Date,

    /// The category label. Not checked against [Category::ALL].
    pub category: String,

    /// The amount spent. Zero and negative amounts are accepted.
    pub amount: f64,

    /// An optional note on the expense.
    ///
    /// Blank descriptions are stored as `NULL`.
    pub description: Option<String>,
}

impl ExpenseBuilder {
    /// Set the description for the expense.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .filter(|text| !text.trim().is_empty())
            .map(str::to_owned);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    // Every read is scoped by owner and sorted by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Record a new expense owned by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// including when `user_id` does not refer to a registered user.
pub fn create_expense(
    user_id: UserID,
    builder: ExpenseBuilder,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (date, category, amount, description, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, date, category, amount, description, user_id",
        )?
        .query_row(
            (
                builder.date,
                builder.category,
                builder.amount,
                builder.description,
                user_id.as_i64(),
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Delete the expense `id` if, and only if, it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFoundOrUnauthorized] if no expense with `id` is owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(
    user_id: UserID,
    id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    if rows_affected == 0 {
        return Err(Error::ExpenseNotFoundOrUnauthorized);
    }

    Ok(())
}

/// Get every expense owned by `user_id`, most recent first.
///
/// Expenses on the same day are ordered by most recently recorded first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_expenses_by_user(user_id: UserID, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, date, category, amount, description, user_id FROM expense
             WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id: DatabaseId = row.get(0)?;
    let date = row.get(1)?;
    let category = row.get(2)?;
    let amount = row.get(3)?;
    let description = row.get(4)?;
    let user_id = UserID::new(row.get(5)?);

    Ok(Expense {
        id,
        date,
        category,
        amount,
        description,
        user_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================
