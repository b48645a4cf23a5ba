//! The endpoint for deleting one of the current user's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::{Alert, push_flash},
    auth::UserID,
    database_id::ExpenseId,
    endpoints,
    expense::core::delete_expense,
};

pub const EXPENSE_DELETED_MSG: &str = "Expense deleted successfully!";
pub const EXPENSE_NOT_FOUND_MSG: &str = "Expense not found or unauthorized.";

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    cookie_key: Key,
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<DeleteExpenseState> for Key {
    fn from_ref(state: &DeleteExpenseState) -> Self {
        state.cookie_key.clone()
    }
}

/// A route handler for deleting one of the current user's expenses, redirects to the overview.
///
/// Missing expenses and expenses owned by someone else get the same message.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => delete_expense(user_id, expense_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let alert = match result {
        Ok(()) => {
            tracing::info!("User {user_id} deleted expense {expense_id}");
            Alert::success(EXPENSE_DELETED_MSG)
        }
        Err(Error::ExpenseNotFoundOrUnauthorized) => {
            tracing::warn!("User {user_id} could not delete expense {expense_id}");
            Alert::error(EXPENSE_NOT_FOUND_MSG)
        }
        Err(error) => {
            tracing::error!("Could not delete expense {expense_id}: {error}");
            return error.into_response();
        }
    };

    (push_flash(jar, alert), Redirect::to(endpoints::ROOT)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        alert::{Alert, take_flash},
        app_state::create_cookie_key,
        auth::{UserID, Username, register_user},
        db::initialize,
        endpoints,
        expense::{Expense, create_expense, get_expenses_by_user},
        test_utils::{assert_redirect, jar_from_response},
    };

    use super::{
        DeleteExpenseState, EXPENSE_DELETED_MSG, EXPENSE_NOT_FOUND_MSG, delete_expense_endpoint,
    };

    fn get_test_state() -> (DeleteExpenseState, UserID, UserID, i64) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let alice = register_user(Username::new_unchecked("alice"), "a", &connection).unwrap();
        let bob = register_user(Username::new_unchecked("bob"), "b", &connection).unwrap();
        let expense = create_expense(
            alice.id,
            Expense::build(date!(2024 - 03 - 01), "Food", 1.0),
            &connection,
        )
        .unwrap();

        let state = DeleteExpenseState {
            cookie_key: create_cookie_key("42"),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, alice.id, bob.id, expense.id)
    }

    async fn delete(state: &DeleteExpenseState, user_id: UserID, expense_id: i64) -> Vec<Alert> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response =
            delete_expense_endpoint(State(state.clone()), Extension(user_id), jar, Path(expense_id))
                .await;

        assert_redirect(&response, endpoints::ROOT);
        let (_, alerts) = take_flash(jar_from_response(&response, state.cookie_key.clone()));
        alerts
    }

    #[tokio::test]
    async fn owner_can_delete_expense() {
        let (state, alice, _, expense_id) = get_test_state();

        let alerts = delete(&state, alice, expense_id).await;

        assert_eq!(alerts, vec![Alert::success(EXPENSE_DELETED_MSG)]);
        let remaining = get_expenses_by_user(alice, &state.db_connection.lock().unwrap()).unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn other_user_cannot_delete_expense() {
        let (state, alice, bob, expense_id) = get_test_state();

        let alerts = delete(&state, bob, expense_id).await;

        assert_eq!(alerts, vec![Alert::error(EXPENSE_NOT_FOUND_MSG)]);
        let remaining = get_expenses_by_user(alice, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn missing_expense_gets_same_message() {
        let (state, alice, _, expense_id) = get_test_state();

        let alerts = delete(&state, alice, expense_id + 100).await;

        assert_eq!(alerts, vec![Alert::error(EXPENSE_NOT_FOUND_MSG)]);
    }
}
