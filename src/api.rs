//! The JSON API for listing and summarising transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    dashboard::summarize,
    timezone::get_local_offset,
    transaction::{FilterQuery, Transaction, filter_transactions, load_local_transactions},
};

/// The state needed by the JSON API and the CSV export.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// The database connection for loading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Africa/Kigali".
    pub local_timezone: String,
}

impl FromRef<AppState> for ApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl ApiState {
    /// Every stored transaction in local time, newest first.
    pub(crate) fn load_transactions(&self) -> Result<Vec<Transaction>, Error> {
        let connection = self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        load_local_transactions(&self.local_timezone, &connection)
    }
}

/// Converts an error into a JSON body of the form `{"error": "..."}`.
fn into_json_response(error: Error) -> Response {
    let status_code = match error {
        Error::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::error!("API request failed: {error}");

    (status_code, Json(json!({ "error": error.to_string() }))).into_response()
}

/// Route handler listing the transactions that match the filters, newest first.
pub async fn get_transactions_api(
    State(state): State<ApiState>,
    Query(filter_query): Query<FilterQuery>,
) -> Result<Json<Vec<Transaction>>, Response> {
    let transactions = state.load_transactions().map_err(into_json_response)?;

    Ok(Json(filter_transactions(&transactions, &filter_query.criteria())))
}

/// Route handler summarising all transactions by type and by month.
pub async fn get_summary_api(State(state): State<ApiState>) -> Result<Response, Response> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        into_json_response(Error::InvalidTimezoneError(state.local_timezone.clone()))
    })?;

    let transactions = state.load_transactions().map_err(into_json_response)?;
    let now = OffsetDateTime::now_utc().to_offset(local_offset);

    Ok(Json(summarize(&transactions, now)).into_response())
}
