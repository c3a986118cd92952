//! Importing transactions from SMS backups and MoMo CSV statements.
//!
//! Both formats are parsed into [TransactionBuilder]s carrying an import ID
//! so that uploading the same file twice does not duplicate transactions.

mod endpoint;
mod momo_csv;
mod page;
mod sms;

use time::OffsetDateTime;

use crate::{Error, transaction::TransactionBuilder};

pub use endpoint::upload_transactions;
pub use momo_csv::parse_momo_csv;
pub use page::get_import_page;
pub use sms::parse_sms_backup;

/// The transactions found in an uploaded file.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedImport {
    /// The transactions ready to be stored.
    pub transactions: Vec<TransactionBuilder>,
    /// The number of records that could not be turned into transactions.
    pub skipped: usize,
}

/// Creates an import ID from the time of a transaction and its raw message.
///
/// The ID is the first eight bytes of the MD5 hash of the two, so the same
/// notification always gets the same ID.
pub fn create_import_id(timestamp: OffsetDateTime, message: &str) -> i64 {
    let hash_128 = md5::compute(format!("{}|{message}", timestamp.unix_timestamp()));
    let mut hash_64 = [0; 8];
    hash_64.copy_from_slice(&hash_128[0..8]);
    i64::from_le_bytes(hash_64)
}

/// The largest amount accepted from an import, one trillion Rwandan francs.
///
/// Sums over millions of transactions at this limit still fit in an `i64`.
pub(crate) const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

/// Parses an amount of Rwandan francs such as "1,000" or "2,500.50".
///
/// Thousands separators are dropped and any fractional part is truncated.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `text` is not a number or is above
/// [AMOUNT_LIMIT], and [Error::NegativeAmount] if it is negative.
pub(crate) fn parse_amount(text: &str) -> Result<i64, Error> {
    let invalid = || Error::InvalidAmount(text.to_owned());

    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let (whole, fraction) = cleaned.split_once('.').unwrap_or((&cleaned, ""));

    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let amount: i64 = whole.parse().map_err(|_| invalid())?;

    if amount < 0 {
        return Err(Error::NegativeAmount(amount));
    }

    if amount > AMOUNT_LIMIT {
        return Err(invalid());
    }

    Ok(amount)
}
