//! The registration page for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::{Alert, alerts_view, push_flash, take_flash},
    auth::{Username, register_user},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, link, log_in_register, password_input, username_input},
};

pub const USERNAME_TAKEN_MSG: &str = "Username already exists.";
pub const EMPTY_USERNAME_MSG: &str = "Username is required.";
pub const REGISTERED_MSG: &str = "Registered successfully.";

fn registration_form() -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::REGISTER)
            class="space-y-4 md:space-y-6"
        {
            (username_input(""))
            (password_input())

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Register"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN, "Log in here"))
            }
        }
    }
}

/// Display the registration page along with any queued alerts.
pub async fn get_register_page(jar: PrivateCookieJar) -> Response {
    let (jar, alerts) = take_flash(jar);
    let content = log_in_register("Create an account", &alerts_view(&alerts), &registration_form());

    (jar, base("Register", &[], &content)).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// Create an account and send the user to the log-in page.
///
/// A taken or blank username queues an error alert and redirects back to the registration page.
/// The existing account is never modified.
pub async fn post_register(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = match Username::new(&user_data.username) {
        Ok(username) => username,
        Err(_) => {
            let jar = push_flash(jar, Alert::error(EMPTY_USERNAME_MSG));
            return (jar, Redirect::to(endpoints::REGISTER)).into_response();
        }
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => register_user(username, &user_data.password, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match result {
        Ok(user) => {
            tracing::info!("Registered user {} with ID {}", user.username, user.id);
            let jar = push_flash(jar, Alert::success(REGISTERED_MSG));
            (jar, Redirect::to(endpoints::LOG_IN)).into_response()
        }
        Err(Error::UsernameTaken) => {
            let jar = push_flash(jar, Alert::error(USERNAME_TAKEN_MSG));
            (jar, Redirect::to(endpoints::REGISTER)).into_response()
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            error.into_response()
        }
    }
}
