//! The details modal for a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    html::{BUTTON_SECONDARY_STYLE, TYPE_BADGE_STYLE, format_currency, format_timestamp},
    timezone::get_local_offset,
    transaction::{Transaction, get_transaction},
};

/// The state needed to show a transaction's details.
#[derive(Debug, Clone)]
pub struct TransactionDetailsState {
    /// The database connection for loading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Africa/Kigali".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionDetailsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Route handler for the details modal of a transaction.
///
/// Returns an HTML fragment meant to be swapped into `#modal-container`, or a
/// 404 alert if the transaction does not exist.
pub async fn get_transaction_details(
    State(state): State<TransactionDetailsState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Response> {
    let offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone()).into_alert_response()
    })?;

    let transaction = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError.into_alert_response()
        })?;

        get_transaction(transaction_id, &connection)
            .inspect_err(|error| {
                tracing::debug!("could not get transaction {transaction_id}: {error}")
            })
            .map_err(Error::into_alert_response)?
    };

    Ok(details_modal_view(&transaction.to_offset(offset)).into_response())
}

fn optional_text(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => "-",
    }
}

fn optional_currency(value: Option<i64>) -> String {
    value
        .map(|amount| format_currency(amount as f64))
        .unwrap_or_else(|| "-".to_owned())
}

fn details_modal_view(transaction: &Transaction) -> Markup {
    let rows = [
        ("Transaction ID", transaction.id.to_string()),
        ("Date & Time", format_timestamp(transaction.timestamp)),
        ("Amount", format_currency(transaction.amount as f64)),
        ("Fee", optional_currency(transaction.fee)),
        ("Phone", optional_text(Some(transaction.phone.as_str())).to_owned()),
        ("Reference", optional_text(Some(transaction.reference.as_str())).to_owned()),
        (
            "Sender",
            optional_text(transaction.sender_name.as_deref()).to_owned(),
        ),
        (
            "Recipient",
            optional_text(transaction.recipient_name.as_deref()).to_owned(),
        ),
        ("New Balance", optional_currency(transaction.new_balance)),
    ];

    html! {
        div
            id="transaction-modal"
            class="fixed inset-0 z-50 flex items-center justify-center bg-black/50 p-4"
            role="dialog"
            aria-modal="true"
            aria-labelledby="transaction-modal-title"
        {
            div
                class="w-full max-w-lg rounded-lg bg-white p-6 shadow-xl
                    text-gray-900 dark:bg-gray-800 dark:text-white"
            {
                div class="flex items-center justify-between mb-4"
                {
                    h3 id="transaction-modal-title" class="text-xl font-semibold"
                    {
                        "Transaction Details"
                    }

                    span class=(TYPE_BADGE_STYLE) { (transaction.transaction_type.label()) }
                }

                dl class="grid grid-cols-2 gap-x-4 gap-y-2 text-sm"
                {
                    @for (label, value) in &rows {
                        dt class="font-medium text-gray-500 dark:text-gray-400" { (label) }
                        dd class="text-right" { (value) }
                    }
                }

                div class="mt-4"
                {
                    h4 class="font-medium text-gray-500 dark:text-gray-400 mb-1" { "Message" }
                    p
                        class="text-sm whitespace-pre-wrap break-words rounded
                            bg-gray-50 dark:bg-gray-700 p-3"
                    {
                        (transaction.message)
                    }
                }

                div class="mt-6 flex justify-end"
                {
                    button
                        type="button"
                        class=(BUTTON_SECONDARY_STYLE)
                        onclick="document.getElementById('transaction-modal').remove()"
                    {
                        "Close"
                    }
                }
            }
        }
    }
}
