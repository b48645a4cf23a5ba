//! The page shown for unknown routes and missing resources.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "Not Found",
        "404",
        "Page not found.",
        "The page you are looking for does not exist or has been moved.",
    );

    (StatusCode::NOT_FOUND, page).into_response()
}
