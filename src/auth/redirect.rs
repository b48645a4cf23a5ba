//! Helpers for redirect URLs during authentication flows.

use axum::{
    extract::Request,
    http::{Method, Uri},
};

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN && path != endpoints::LOG_OUT
}

/// Reduce `raw_url` to a path and query on this site, or `None` if it would
/// leave the site or loop back to the log-in page.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that sends the user back to the page they requested.
///
/// Only GET requests can be replayed by a redirect, so other methods go to the plain log-in page.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    if request.method() != Method::GET {
        return endpoints::LOG_IN.to_owned();
    }

    request
        .uri()
        .path_and_query()
        .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
        .filter(|target| target != endpoints::ROOT)
        .and_then(|target| build_log_in_redirect_url_from_target(&target))
        .unwrap_or_else(|| endpoints::LOG_IN.to_owned())
}

fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}
