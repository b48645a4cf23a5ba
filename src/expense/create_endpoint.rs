//! Defines the endpoint for recording a new expense.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    alert::{Alert, push_flash},
    auth::UserID,
    endpoints,
    expense::{Expense, core::create_expense, filter::DATE_FORMAT},
};

pub const EXPENSE_ADDED_MSG: &str = "Expense added successfully!";
pub const INVALID_DATE_MSG: &str = "Invalid date format.";
pub const INVALID_AMOUNT_MSG: &str = "Invalid amount.";

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<CreateExpenseState> for Key {
    fn from_ref(state: &CreateExpenseState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for creating an expense.
///
/// Dates and amounts arrive as text so that malformed values can be reported
/// to the user instead of being rejected by the extractor.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// The date in the format YYYY-MM-DD.
    pub date: String,
    /// The category label.
    pub category: String,
    /// The amount spent.
    pub amount: String,
    /// An optional note.
    pub description: Option<String>,
}

/// A route handler for recording an expense for the current user, redirects to the overview.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let Ok(date) = Date::parse(form.date.trim(), DATE_FORMAT) else {
        tracing::debug!("Rejected expense with invalid date {:?}", form.date);
        return redirect_with(jar, Alert::error(INVALID_DATE_MSG));
    };

    let amount = match form.amount.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            tracing::debug!("Rejected expense with invalid amount {:?}", form.amount);
            return redirect_with(jar, Alert::error(INVALID_AMOUNT_MSG));
        }
    };

    let builder =
        Expense::build(date, &form.category, amount).description(form.description.as_deref());

    let result = match state.db_connection.lock() {
        Ok(connection) => create_expense(user_id, builder, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match result {
        Ok(expense) => {
            tracing::info!("User {user_id} added expense {}", expense.id);
            redirect_with(jar, Alert::success(EXPENSE_ADDED_MSG))
        }
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            error.into_response()
        }
    }
}

fn redirect_with(jar: PrivateCookieJar, alert: Alert) -> Response {
    (push_flash(jar, alert), Redirect::to(endpoints::ROOT)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use axum_extra::extract::{Form, PrivateCookieJar};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        alert::{Alert, take_flash},
        app_state::create_cookie_key,
        auth::{UserID, Username, register_user},
        db::initialize,
        endpoints,
        expense::core::get_expenses_by_user,
        test_utils::{assert_redirect, jar_from_response},
    };

    use super::{
        CreateExpenseState, EXPENSE_ADDED_MSG, ExpenseForm, INVALID_AMOUNT_MSG, INVALID_DATE_MSG,
        create_expense_endpoint,
    };

    fn get_test_state() -> (CreateExpenseState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = register_user(Username::new_unchecked("alice"), "a", &connection).unwrap();

        let state = CreateExpenseState {
            cookie_key: create_cookie_key("42"),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, user.id)
    }

    fn form(date: &str, amount: &str, description: Option<&str>) -> Form<ExpenseForm> {
        Form(ExpenseForm {
            date: date.to_owned(),
            category: "Food".to_owned(),
            amount: amount.to_owned(),
            description: description.map(str::to_owned),
        })
    }

    async fn post(state: &CreateExpenseState, user_id: UserID, form: Form<ExpenseForm>) -> Vec<Alert> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = create_expense_endpoint(State(state.clone()), Extension(user_id), jar, form).await;

        assert_redirect(&response, endpoints::ROOT);
        let (_, alerts) = take_flash(jar_from_response(&response, state.cookie_key.clone()));
        alerts
    }

    #[tokio::test]
    async fn can_create_expense() {
        let (state, user_id) = get_test_state();

        let alerts = post(&state, user_id, form("2024-03-01", "42.50", Some("lunch"))).await;

        assert_eq!(alerts, vec![Alert::success(EXPENSE_ADDED_MSG)]);
        let expenses = get_expenses_by_user(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(expenses.len(), 1);
        let expense = &expenses[0];
        assert_eq!(expense.date, date!(2024 - 03 - 01));
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.amount, 42.50);
        assert_eq!(expense.description.as_deref(), Some("lunch"));
        assert_eq!(expense.user_id, user_id);
    }

    #[tokio::test]
    async fn missing_description_is_stored_as_none() {
        let (state, user_id) = get_test_state();

        post(&state, user_id, form("2024-03-01", "5", None)).await;

        let expenses = get_expenses_by_user(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(expenses[0].description, None);
    }

    #[tokio::test]
    async fn invalid_date_is_rejected() {
        let (state, user_id) = get_test_state();

        let alerts = post(&state, user_id, form("01/03/2024", "5", None)).await;

        assert_eq!(alerts, vec![Alert::error(INVALID_DATE_MSG)]);
        let expenses = get_expenses_by_user(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected() {
        let (state, user_id) = get_test_state();

        for amount in ["", "ten", "NaN", "inf"] {
            let alerts = post(&state, user_id, form("2024-03-01", amount, None)).await;

            assert_eq!(alerts, vec![Alert::error(INVALID_AMOUNT_MSG)], "amount {amount:?}");
        }
        let expenses = get_expenses_by_user(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(expenses.is_empty());
    }
}
