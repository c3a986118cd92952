use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Instant,
};

use axum::{
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::UtcOffset;

use crate::{
    AppState, Error,
    alert::Alert,
    import::{ParsedImport, parse_momo_csv, parse_sms_backup},
    timezone::get_local_offset,
    transaction::import_transactions,
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for storing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Africa/Kigali".
    ///
    /// CSV timestamps without an offset are assumed to be in this timezone.
    pub local_timezone: String,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The formats accepted by the upload endpoint, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    SmsBackup,
    MomoCsv,
}

impl UploadKind {
    fn from_file_name(file_name: &str) -> Result<Self, Error> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xml") => Ok(UploadKind::SmsBackup),
            Some("csv") => Ok(UploadKind::MomoCsv),
            _ => Err(Error::InvalidFileType(file_name.to_owned())),
        }
    }

    fn parse(self, text: &str, local_offset: UtcOffset) -> Result<ParsedImport, Error> {
        match self {
            UploadKind::SmsBackup => parse_sms_backup(text),
            UploadKind::MomoCsv => parse_momo_csv(text, local_offset),
        }
    }
}

/// Route handler for importing transactions from SMS backups and MoMo CSV files.
///
/// Every uploaded file is parsed before anything is stored, and the
/// transactions are stored in a single SQL transaction, so a bad file leaves
/// the database untouched. Transactions that were imported before are ignored.
pub async fn upload_transactions(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let start_time = Instant::now();

    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone()).into_alert_response()
    })?;

    let mut transactions = Vec::new();
    let mut skipped = 0;
    let mut file_count = 0;

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        tracing::error!("Could not read multipart field: {error}");
        Error::MultipartError(error.body_text()).into_alert_response()
    })? {
        let (kind, text) = read_upload(field).await.map_err(Error::into_alert_response)?;

        let parsed = kind
            .parse(&text, local_offset)
            .inspect_err(|error| tracing::debug!("Failed to parse upload: {error}"))
            .map_err(Error::into_alert_response)?;

        file_count += 1;
        skipped += parsed.skipped;
        transactions.extend(parsed.transactions);
    }

    if file_count == 0 {
        return Err(
            Error::MultipartError("No files were uploaded.".to_owned()).into_alert_response()
        );
    }

    let found_count = transactions.len();

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let tx = connection
        .unchecked_transaction()
        .inspect_err(|error| tracing::error!("could not start transaction: {error}"))
        .map_err(|_| {
            Alert::ErrorSimple {
                message: "Could not import transactions".to_owned(),
            }
            .into_response()
        })?;

    let imported = import_transactions(transactions, &tx)
        .inspect_err(|error| tracing::error!("Failed to import transactions: {error}"))
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Import failed".to_owned(),
                    details: "An unexpected error occurred, please try again later".to_owned(),
                }
                .into_html(),
            )
                .into_response()
        })?;

    tx.commit()
        .inspect_err(|error| tracing::error!("could not commit transaction: {error}"))
        .map_err(|_| {
            Alert::ErrorSimple {
                message: "Could not import transactions".to_owned(),
            }
            .into_response()
        })?;

    let duplicate_count = found_count - imported.len();
    let duration = start_time.elapsed();

    tracing::info!(
        "Imported {} transactions from {file_count} file(s) in {}ms, {duplicate_count} duplicates, {skipped} skipped",
        imported.len(),
        duration.as_millis()
    );

    let alert = Alert::Success {
        message: "Import completed successfully!".to_owned(),
        details: format!(
            "Imported {} new transactions in {}ms. Ignored {duplicate_count} duplicates and \
            skipped {skipped} unrecognised messages.",
            imported.len(),
            duration.as_millis()
        ),
    };

    Ok((StatusCode::CREATED, alert.into_html()).into_response())
}

async fn read_upload(field: Field<'_>) -> Result<(UploadKind, String), Error> {
    let file_name = match field.file_name() {
        Some(file_name) => file_name.to_owned(),
        None => {
            tracing::error!("Could not get file name from multipart form field: {field:#?}");
            return Err(Error::MultipartError(
                "Could not get file name from multipart form field".to_owned(),
            ));
        }
    };

    let kind = UploadKind::from_file_name(&file_name)?;

    let data = field.text().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("Received file '{file_name}' that is {} bytes", data.len());

    Ok((kind, data))
}
