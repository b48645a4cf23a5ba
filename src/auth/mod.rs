//! User accounts and sessions: the credential store, the session cookie and the guard that
//! protects expense routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
pub use redirect::normalize_redirect_url;
pub use register::{get_register_page, post_register};
pub(crate) use token::Token;
pub use user::{
    User, UserID, Username, authenticate, create_user_table, get_user_by_id, register_user,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
