//! Alert system for displaying success and error messages to users.
//!
//! Alerts that must survive a redirect are queued in a private "flash"
//! cookie and shown, then cleared, by the next page that renders them.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

pub(crate) const COOKIE_FLASH: &str = "flash";

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    Success,
    Error,
}

/// A short notice for the user, e.g. "Expense added successfully!".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub message: String,
}

impl Alert {
    /// Create a new success alert
    pub fn success(message: &str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message: message.to_owned(),
        }
    }

    /// Create a new error alert
    pub fn error(message: &str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message: message.to_owned(),
        }
    }

    fn to_html(&self) -> Markup {
        let (style, role) = match self.alert_type {
            AlertType::Success => (
                "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400",
                "status",
            ),
            AlertType::Error => (
                "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400",
                "alert",
            ),
        };

        html!(
            div class=(style) role=(role) data-alert-type=(self.alert_type.as_str())
            {
                (self.message)
            }
        )
    }
}

impl AlertType {
    fn as_str(&self) -> &'static str {
        match self {
            AlertType::Success => "success",
            AlertType::Error => "error",
        }
    }
}

/// Render a list of alerts, most recent last.
pub fn alerts_view(alerts: &[Alert]) -> Markup {
    html!(
        @if !alerts.is_empty() {
            div id="alerts" class="w-full"
            {
                @for alert in alerts {
                    (alert.to_html())
                }
            }
        }
    )
}

/// Queue `alert` so that it is displayed on the next rendered page.
///
/// Existing queued alerts are kept.
pub fn push_flash(jar: PrivateCookieJar, alert: Alert) -> PrivateCookieJar {
    let mut alerts = read_flash(&jar);
    alerts.push(alert);

    match serde_json::to_string(&alerts) {
        Ok(value) => jar.add(
            Cookie::build((COOKIE_FLASH, value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ),
        Err(error) => {
            tracing::error!("Could not serialize flash alerts: {error}");
            jar
        }
    }
}

/// Remove and return the queued alerts.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Alert>) {
    let alerts = read_flash(&jar);

    if jar.get(COOKIE_FLASH).is_none() {
        return (jar, alerts);
    }

    (jar.remove(Cookie::build(COOKIE_FLASH).path("/")), alerts)
}

fn read_flash(jar: &PrivateCookieJar) -> Vec<Alert> {
    jar.get(COOKIE_FLASH)
        .and_then(|cookie| {
            serde_json::from_str(cookie.value_trimmed())
                .inspect_err(|error| tracing::warn!("Discarding malformed flash cookie: {error}"))
                .ok()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use scraper::{Html, Selector};
    use sha2::{Digest, Sha512};

    use super::{Alert, AlertType, alerts_view, push_flash, take_flash};

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::from(&Sha512::digest("flash")))
    }

    #[test]
    fn take_flash_returns_alerts_in_order() {
        let jar = push_flash(get_jar(), Alert::success("first"));
        let jar = push_flash(jar, Alert::error("second"));

        let (_, alerts) = take_flash(jar);

        assert_eq!(alerts, vec![Alert::success("first"), Alert::error("second")]);
    }

    #[test]
    fn take_flash_clears_alerts() {
        let jar = push_flash(get_jar(), Alert::success("once"));

        let (jar, _) = take_flash(jar);
        let (_, alerts) = take_flash(jar);

        assert!(alerts.is_empty(), "got {alerts:?}");
    }

    #[test]
    fn empty_jar_has_no_alerts() {
        let (_, alerts) = take_flash(get_jar());

        assert!(alerts.is_empty());
    }

    #[test]
    fn renders_each_alert() {
        let markup = alerts_view(&[Alert::success("Yay"), Alert::error("Nay")]);
        let html = Html::parse_fragment(&markup.into_string());
        let selector = Selector::parse("div[data-alert-type]").unwrap();

        let alerts = html
            .select(&selector)
            .map(|element| {
                (
                    element.value().attr("data-alert-type").unwrap().to_owned(),
                    element.text().collect::<String>().trim().to_owned(),
                )
            })
            .collect::<Vec<_>>();

        assert_eq!(
            alerts,
            vec![
                ("success".to_owned(), "Yay".to_owned()),
                ("error".to_owned(), "Nay".to_owned())
            ]
        );
        assert_eq!(Alert::error("x").alert_type, AlertType::Error);
    }
}
