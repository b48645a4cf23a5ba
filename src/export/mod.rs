//! Downloads of a user's complete expense history as CSV or PDF.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    expense::{Expense, get_expenses_by_user},
};

mod csv;
mod pdf;

pub use self::csv::download_csv;
pub use self::pdf::download_pdf;

/// The state needed to export expenses.
#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn load_expenses(state: &ExportState, user_id: UserID) -> Result<Vec<Expense>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_expenses_by_user(user_id, &connection)
}
