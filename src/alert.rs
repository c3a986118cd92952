//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that htmx swaps into the
//! `#alert-container` element of the base page.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A message shown to the user after an action completes or fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action succeeded.
    Success { message: String, details: String },
    /// The action failed, `details` explains what the user can do about it.
    Error { message: String, details: String },
    /// The action failed and there is nothing more to say.
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (container_style, icon, message, details) = match self {
            Alert::Success { message, details } => (
                "text-green-800 bg-green-50 border-green-300 dark:bg-gray-800 \
                dark:text-green-400 dark:border-green-800",
                "✓",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "text-red-800 bg-red-50 border-red-300 dark:bg-gray-800 \
                dark:text-red-400 dark:border-red-800",
                "!",
                message,
                details,
            ),
            Alert::ErrorSimple { message } => (
                "text-red-800 bg-red-50 border-red-300 dark:bg-gray-800 \
                dark:text-red-400 dark:border-red-800",
                "!",
                message,
                String::new(),
            ),
        };

        // Alert markup adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class={ "flex items-start p-4 mb-4 text-sm border rounded-lg shadow " (container_style) }
                {
                    span class="font-bold me-3" { (icon) }

                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="ms-3 font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::Alert;

    #[test]
    fn success_alert_contains_message_and_details() {
        let html = Alert::Success {
            message: "Import completed".to_owned(),
            details: "Imported 3 transactions.".to_owned(),
        }
        .into_html()
        .into_string();

        assert!(html.contains("Import completed"));
        assert!(html.contains("Imported 3 transactions."));
        assert!(html.contains("text-green-800"));
    }

    #[test]
    fn simple_error_alert_omits_details() {
        let html = Alert::ErrorSimple {
            message: "Could not import transactions".to_owned(),
        }
        .into_html()
        .into_string();

        assert!(html.contains("Could not import transactions"));
        assert!(html.contains("text-red-800"));
        assert!(!html.contains("mt-1"));
    }
}
