use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE},
    response::Response,
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};

/// Build the jar a browser would send back after receiving `response`.
///
/// Cookies added by a handler only live in the jar's delta, so handlers that
/// remove cookies must be tested with a jar whose cookies came from request
/// headers.
pub(crate) fn jar_from_response(response: &Response<Body>, key: Key) -> PrivateCookieJar {
    let cookie_pairs: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .filter_map(|header| Cookie::parse(header.to_owned()).ok())
        .filter(|cookie| cookie.max_age() != Some(time::Duration::ZERO))
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();

    let mut headers = HeaderMap::new();

    if !cookie_pairs.is_empty() {
        let value = HeaderValue::from_str(&cookie_pairs.join("; "))
            .expect("Could not build cookie header");
        headers.insert(COOKIE, value);
    }

    PrivateCookieJar::from_headers(&headers, key)
}
