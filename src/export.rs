//! Downloading the filtered transactions as a CSV file.

use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time::format_description::well_known::Rfc3339;

use crate::{
    Error,
    alert::Alert,
    api::ApiState,
    transaction::{FilterQuery, Transaction, filter_transactions},
};

/// The name the browser saves the export as.
pub const EXPORT_FILE_NAME: &str = "mtn_momo_transactions.csv";

const HEADER: [&str; 6] = ["Timestamp", "Type", "Amount", "Phone", "Reference", "Message"];

/// Route handler for exporting the transactions that match the filters.
///
/// The file has the same layout the MoMo CSV importer reads, newest first.
pub async fn export_transactions(
    State(state): State<ApiState>,
    Query(filter_query): Query<FilterQuery>,
) -> Result<Response, Response> {
    let transactions = state
        .load_transactions()
        .map_err(Error::into_alert_response)?;
    let filtered = filter_transactions(&transactions, &filter_query.criteria());

    let csv = transactions_to_csv(&filtered)
        .inspect_err(|error| tracing::error!("could not export transactions: {error}"))
        .map_err(|_| {
            Alert::ErrorSimple {
                message: "Could not export transactions".to_owned(),
            }
            .into_response()
        })?;

    tracing::debug!("exporting {} transactions", filtered.len());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Write `transactions` as CSV.
///
/// Every field of a data row is quoted, so messages with commas, quotes, line
/// breaks or only digits survive a round trip. The header is quoted only when
/// necessary.
fn transactions_to_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let into_error = |error: csv::Error| Error::SerializationError(error.to_string());

    let mut header_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    header_writer.write_record(HEADER).map_err(into_error)?;

    let mut buffer = header_writer
        .into_inner()
        .map_err(|error| Error::SerializationError(error.to_string()))?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(&mut buffer);

    for transaction in transactions {
        let timestamp = transaction
            .timestamp
            .format(&Rfc3339)
            .map_err(|error| Error::SerializationError(error.to_string()))?;

        writer
            .write_record([
                timestamp.as_str(),
                transaction.transaction_type.as_str(),
                transaction.amount.to_string().as_str(),
                transaction.phone.as_str(),
                transaction.reference.as_str(),
                transaction.message.as_str(),
            ])
            .map_err(into_error)?;
    }

    writer
        .flush()
        .map_err(|error| Error::SerializationError(error.to_string()))?;
    drop(writer);

    String::from_utf8(buffer).map_err(|error| Error::SerializationError(error.to_string()))
}
