//! Parses MoMo statement CSV files with the columns
//! `Timestamp,Type,Amount,Phone,Reference,Message`.
//!
//! This is the same layout the CSV export produces, so an exported file can
//! be imported again without creating duplicates.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{
    Error,
    import::{ParsedImport, create_import_id, parse_amount},
    transaction::{Transaction, TransactionBuilder, TransactionType},
};

const EXPECTED_HEADER: [&str; 6] = ["Timestamp", "Type", "Amount", "Phone", "Reference", "Message"];

const LOCAL_TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Deserialize)]
struct MomoRecord {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Type")]
    transaction_type: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Phone")]
    phone: String,
    #[serde(rename = "Reference")]
    reference: String,
    #[serde(rename = "Message")]
    message: String,
}

fn fee_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| Regex::new(r"Fee: RWF ([\d,.]+)").expect("fee pattern is valid"))
}

fn balance_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| {
        Regex::new(r"Your new balance is RWF ([\d,.]+)").expect("balance pattern is valid")
    })
}

/// Parses a MoMo statement CSV into transactions.
///
/// Timestamps may be RFC 3339 or `YYYY-MM-DD HH:MM:SS`, the latter is
/// assumed to be in `local_offset`. Rows with an unknown type, a bad amount
/// or a bad timestamp are logged and skipped.
///
/// # Errors
/// Returns [Error::InvalidCSV] if the header does not match or a row does not
/// have the expected number of columns.
pub fn parse_momo_csv(text: &str, local_offset: UtcOffset) -> Result<ParsedImport, Error> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    if header.iter().map(str::trim).ne(EXPECTED_HEADER) {
        return Err(Error::InvalidCSV(format!(
            "expected the header {} but got {}",
            EXPECTED_HEADER.join(","),
            header.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut parsed = ParsedImport::default();

    for (index, record) in reader.deserialize::<MomoRecord>().enumerate() {
        // The header is line 1.
        let line_number = index + 2;
        let record = record
            .map_err(|error| Error::InvalidCSV(format!("line {line_number}: {error}")))?;

        match parse_record(&record, local_offset) {
            Ok(builder) => parsed.transactions.push(builder),
            Err(error) => {
                tracing::warn!("Skipping CSV line {line_number}: {error}");
                parsed.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Parsed {} transactions from CSV, skipped {}",
        parsed.transactions.len(),
        parsed.skipped
    );

    Ok(parsed)
}

fn parse_record(record: &MomoRecord, local_offset: UtcOffset) -> Result<TransactionBuilder, Error> {
    let timestamp = parse_timestamp(&record.timestamp, local_offset)?;
    let transaction_type = parse_transaction_type(&record.transaction_type)?;
    let amount = parse_amount(&record.amount)?;

    let fee = capture_amount(fee_pattern(), &record.message);
    let new_balance = capture_amount(balance_pattern(), &record.message);

    Ok(Transaction::build(timestamp, transaction_type, amount)
        .phone(record.phone.trim())
        .reference(record.reference.trim())
        .message(&record.message)
        .fee(fee)
        .new_balance(new_balance)
        .import_id(Some(create_import_id(timestamp, &record.message))))
}

fn parse_timestamp(text: &str, local_offset: UtcOffset) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    if let Ok(timestamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(timestamp);
    }

    PrimitiveDateTime::parse(text, LOCAL_TIMESTAMP_FORMAT)
        .map(|timestamp| timestamp.assume_offset(local_offset))
        .map_err(|error| Error::InvalidCSV(format!("could not parse timestamp \"{text}\": {error}")))
}

/// Accepts either the snake_case name or the display label of a type.
fn parse_transaction_type(text: &str) -> Result<TransactionType, Error> {
    let text = text.trim();

    text.parse().or_else(|error| {
        TransactionType::ALL
            .into_iter()
            .find(|transaction_type| transaction_type.label().eq_ignore_ascii_case(text))
            .ok_or(error)
    })
}

fn capture_amount(pattern: &Regex, message: &str) -> Option<i64> {
    let captures = pattern.captures(message)?;

    parse_amount(captures.get(1)?.as_str().trim_end_matches('.')).ok()
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime, macros::offset};

    use crate::{Error, import::create_import_id, transaction::TransactionType};

    use super::parse_momo_csv;

    const KIGALI: UtcOffset = offset!(+2);

    #[test]
    fn parses_statement() {
        let text = "Timestamp,Type,Amount,Phone,Reference,Message
2025-03-01 09:30:00,incoming_money,\"2,000\",+250781234567,MTN12345,\"You have received RWF 2000 from +250781234567. Your new balance is RWF 12,000. Reference: MTN12345\"
2025-03-02T08:00:00Z,Transfer Mobile,5000,+250787654321,MTN54321,\"You have transferred RWF 5000 to +250787654321. Fee: RWF 50. Reference: MTN54321\"
";

        let got = parse_momo_csv(text, KIGALI).unwrap();

        assert_eq!(got.skipped, 0);
        assert_eq!(got.transactions.len(), 2);

        let first = &got.transactions[0];
        assert_eq!(first.timestamp, datetime!(2025-03-01 09:30 +02:00));
        assert_eq!(first.transaction_type, TransactionType::IncomingMoney);
        assert_eq!(first.amount, 2000);
        assert_eq!(first.phone, "+250781234567");
        assert_eq!(first.reference, "MTN12345");
        assert_eq!(first.new_balance, Some(12_000));
        assert_eq!(first.fee, None);
        assert_eq!(
            first.import_id,
            Some(create_import_id(first.timestamp, &first.message))
        );

        let second = &got.transactions[1];
        assert_eq!(second.timestamp, datetime!(2025-03-02 08:00 UTC));
        assert_eq!(second.transaction_type, TransactionType::TransferMobile);
        assert_eq!(second.fee, Some(50));
    }

    #[test]
    fn keeps_quotes_in_messages() {
        let text = "Timestamp,Type,Amount,Phone,Reference,Message
2025-03-01T09:30:00Z,payment_to_code,100,,,\"Paid \"\"Corner Shop\"\"\"
";

        let got = parse_momo_csv(text, KIGALI).unwrap();

        assert_eq!(got.transactions[0].message, "Paid \"Corner Shop\"");
    }

    #[test]
    fn skips_bad_rows() {
        let text = "Timestamp,Type,Amount,Phone,Reference,Message
2025-03-01T09:30:00Z,lottery_win,100,,,unknown type
2025-03-01T09:30:00Z,airtime_payment,-100,,,negative
2025-03-01T09:30:00Z,airtime_payment,lots,,,not a number
yesterday,airtime_payment,100,,,bad timestamp
2025-03-01T09:30:00Z,airtime_payment,100,,,ok
";

        let got = parse_momo_csv(text, KIGALI).unwrap();

        assert_eq!(got.skipped, 4);
        assert_eq!(got.transactions.len(), 1);
        assert_eq!(got.transactions[0].message, "ok");
    }

    #[test]
    fn rejects_wrong_header() {
        let text = "Date,Unique Id,Tran Type,Cheque Number,Payee,Memo,Amount\n";

        let result = parse_momo_csv(text, KIGALI);

        assert!(
            matches!(result, Err(Error::InvalidCSV(_))),
            "want InvalidCSV, got {result:?}"
        );
    }

    #[test]
    fn rejects_rows_with_missing_columns() {
        let text = "Timestamp,Type,Amount,Phone,Reference,Message
2025-03-01T09:30:00Z,airtime_payment,100
";

        let result = parse_momo_csv(text, KIGALI);

        assert!(
            matches!(result, Err(Error::InvalidCSV(_))),
            "want InvalidCSV, got {result:?}"
        );
    }

    #[test]
    fn header_only_is_empty_import() {
        let got = parse_momo_csv("Timestamp,Type,Amount,Phone,Reference,Message\n", KIGALI);

        assert_eq!(got.map(|parsed| parsed.transactions.len()), Ok(0));
    }
}
