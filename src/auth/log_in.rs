//! This file defines the routes for displaying the log-in page and handling log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    alert::{Alert, alerts_view, take_flash},
    auth::{authenticate, normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, link, log_in_register, password_input, username_input},
    timezone::get_local_offset,
};

/// The message shown for a failed log-in, whatever the cause.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid credentials.";

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

fn log_in_form(username: &str, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::LOG_IN)
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (username_input(username))
            (password_input())

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                (link(endpoints::REGISTER, "Register here"))
            }
        }
    }
}

fn log_in_view(username: &str, alerts: &[Alert], redirect_url: Option<&str>) -> Markup {
    let form = log_in_form(username, redirect_url);
    let content = log_in_register("Log in to your account", &alerts_view(alerts), &form);

    base("Log In", &[], &content)
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page along with any queued alerts, e.g. "Registered successfully.".
pub async fn get_log_in_page(jar: PrivateCookieJar, Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let (jar, alerts) = take_flash(jar);

    (jar, log_in_view("", &alerts, redirect_url.as_deref())).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The password is compared verbatim against the stored password.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,

    /// Password entered during log-in.
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is redirected to the
/// expense overview (or the page they originally requested). Otherwise, the log-in page is
/// returned with a generic "invalid credentials" message.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");

    let user_id = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        authenticate(&user_data.username, &user_data.password, &connection)
    };

    let user_id = match user_id {
        Ok(user_id) => user_id,
        Err(Error::InvalidCredentials) => {
            tracing::info!("Failed log-in attempt for {:?}", user_data.username);
            return log_in_view(
                &user_data.username,
                &[Alert::error(INVALID_CREDENTIALS_ERROR_MSG)],
                redirect_url.as_deref(),
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return error.into_response();
        }
    };

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let redirect_url = redirect_url.as_deref().unwrap_or(endpoints::ROOT);

    match set_auth_cookie(jar, user_id, cookie_duration, local_offset) {
        Ok(jar) => (jar, Redirect::to(redirect_url)).into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::{StatusCode, header::SET_COOKIE},
    };
    use axum_extra::extract::{Form, PrivateCookieJar};
    use rusqlite::Connection;

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, Username, register_user},
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_valid_html, get_header,
            must_get_form, parse_html_document,
        },
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, RedirectQuery, get_log_in_page,
        post_log_in,
    };

    fn get_test_state() -> LoginState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        register_user(Username::new_unchecked("alice"), "hunter2", &connection).unwrap();

        LoginState {
            cookie_key: create_cookie_key("42"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(username: &str, password: &str, redirect_url: Option<&str>) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
            remember_me: None,
            redirect_url: redirect_url.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_log_in_page(jar, Query(RedirectQuery { redirect_url: None })).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_eq!(form.value().attr("action"), Some(endpoints::LOG_IN));
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn log_in_succeeds_and_redirects_to_root() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(State(state), jar, Form(form("alice", "hunter2", None))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::ROOT);
        let set_cookie = get_header(&response, SET_COOKIE.as_str());
        assert!(set_cookie.starts_with(COOKIE_TOKEN), "got {set_cookie}");
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_page() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(
            State(state),
            jar,
            Form(form("alice", "hunter2", Some(endpoints::DOWNLOAD_CSV))),
        )
        .await;

        assert_eq!(get_header(&response, "location"), endpoints::DOWNLOAD_CSV);
    }

    #[tokio::test]
    async fn log_in_ignores_external_redirect() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(
            State(state),
            jar,
            Form(form("alice", "hunter2", Some("https://example.com"))),
        )
        .await;

        assert_eq!(get_header(&response, "location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_get_the_same_message() {
        for (username, password) in [("alice", "wrong"), ("mallory", "hunter2")] {
            let state = get_test_state();
            let jar = PrivateCookieJar::new(state.cookie_key.clone());

            let response =
                post_log_in(State(state), jar, Form(form(username, password, None))).await;

            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get(SET_COOKIE).is_none());
            let document = parse_html_document(response).await;
            let alert = document
                .select(&scraper::Selector::parse("div[role=alert]").unwrap())
                .next()
                .expect("No alert found");
            assert_eq!(
                alert.text().collect::<String>().trim(),
                INVALID_CREDENTIALS_ERROR_MSG
            );
        }
    }
}
