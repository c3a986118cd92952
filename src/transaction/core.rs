//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error, database_id::TransactionId, timezone::get_local_offset, transaction::TransactionType,
};

// ============================================================================
// MODELS
// ============================================================================

/// A mobile money event derived from an SMS notification or a statement row.
///
/// To create a new `Transaction`, use [Transaction::build] and store it with
/// [create_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// The category of the transaction.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money moved, in whole Rwandan francs. Never negative.
    pub amount: i64,
    /// The phone number of the other party, may be masked or empty.
    pub phone: String,
    /// The merchant code or transaction ID, may be empty.
    pub reference: String,
    /// The full text of the notification.
    pub message: String,
    /// The fee charged for the transaction, if the notification reported one.
    pub fee: Option<i64>,
    /// The name of whoever sent the money, if known.
    pub sender_name: Option<String>,
    /// The name of whoever received the money, if known.
    pub recipient_name: Option<String>,
    /// The account balance after the transaction, if the notification reported one.
    pub new_balance: Option<i64>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        timestamp: OffsetDateTime,
        transaction_type: TransactionType,
        amount: i64,
    ) -> TransactionBuilder {
        TransactionBuilder {
            timestamp,
            transaction_type,
            amount,
            phone: String::new(),
            reference: String::new(),
            message: String::new(),
            fee: None,
            sender_name: None,
            recipient_name: None,
            new_balance: None,
            import_id: None,
        }
    }

    /// The same transaction with its timestamp expressed in `offset`.
    pub fn to_offset(mut self, offset: UtcOffset) -> Self {
        self.timestamp = self.timestamp.to_offset(offset);
        self
    }
}

/// A builder for creating [Transaction] instances.
///
/// Only the timestamp, type and amount are required, the remaining text
/// fields default to empty strings and the optional fields to `None`.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// When the transaction happened.
    pub timestamp: OffsetDateTime,

    /// The category of the transaction.
    pub transaction_type: TransactionType,

    /// The amount in whole Rwandan francs.
    ///
    /// Must not be negative, [create_transaction] rejects negative amounts
    /// with [Error::NegativeAmount].
    pub amount: i64,

    /// The phone number of the other party.
    pub phone: String,

    /// The merchant code or transaction ID.
    pub reference: String,

    /// The full text of the notification.
    pub message: String,

    /// The fee charged for the transaction.
    pub fee: Option<i64>,

    /// The name of whoever sent the money.
    pub sender_name: Option<String>,

    /// The name of whoever received the money.
    pub recipient_name: Option<String>,

    /// The account balance after the transaction.
    pub new_balance: Option<i64>,

    /// Optional unique identifier for imported transactions.
    ///
    /// The database enforces uniqueness on this field so that importing the
    /// same SMS backup twice does not duplicate transactions. See
    /// [crate::import::create_import_id].
    pub import_id: Option<i64>,
}

impl TransactionBuilder {
    /// Set the phone number of the other party.
    pub fn phone(mut self, phone: &str) -> Self {
        self.phone = phone.to_owned();
        self
    }

    /// Set the merchant code or transaction ID.
    pub fn reference(mut self, reference: &str) -> Self {
        self.reference = reference.to_owned();
        self
    }

    /// Set the notification text.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_owned();
        self
    }

    /// Set the fee.
    pub fn fee(mut self, fee: Option<i64>) -> Self {
        self.fee = fee;
        self
    }

    /// Set the sender name.
    pub fn sender_name(mut self, sender_name: Option<String>) -> Self {
        self.sender_name = sender_name;
        self
    }

    /// Set the recipient name.
    pub fn recipient_name(mut self, recipient_name: Option<String>) -> Self {
        self.recipient_name = recipient_name;
        self
    }

    /// Set the balance after the transaction.
    pub fn new_balance(mut self, new_balance: Option<i64>) -> Self {
        self.new_balance = new_balance;
        self
    }

    /// Set the import ID for the transaction.
    pub fn import_id(mut self, import_id: Option<i64>) -> Self {
        self.import_id = import_id;
        self
    }

    /// Turn the builder into a transaction with the given `id` without
    /// touching the database.
    #[cfg(test)]
    pub fn finalise(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            timestamp: self.timestamp,
            transaction_type: self.transaction_type,
            amount: self.amount,
            phone: self.phone,
            reference: self.reference,
            message: self.message,
            fee: self.fee,
            sender_name: self.sender_name,
            recipient_name: self.recipient_name,
            new_balance: self.new_balance,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "id, timestamp, type, amount, phone, reference, message, fee, \
    sender_name, recipient_name, new_balance";

/// Create a new transaction in the database from a builder.
///
/// Timestamps are stored in UTC so that they sort chronologically.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is below zero,
/// - or [Error::DuplicateImportId] if a transaction with the specified import ID already exists,
/// - or [Error::SqlError] if there is some other SQL error.
#[cfg(test)]
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if builder.amount < 0 {
        return Err(Error::NegativeAmount(builder.amount));
    }

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (timestamp, type, amount, phone, reference, message, \
                fee, sender_name, recipient_name, new_balance, import_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                builder.timestamp.to_offset(UtcOffset::UTC),
                builder.transaction_type,
                builder.amount,
                builder.phone,
                builder.reference,
                builder.message,
                builder.fee,
                builder.sender_name,
                builder.recipient_name,
                builder.new_balance,
                builder.import_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateImportId,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Import many transactions, skipping any whose import ID is already stored.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// Returns an [Error::NegativeAmount] if a builder has a negative amount, or
/// an [Error::SqlError] if there is an unexpected SQL error.
pub fn import_transactions(
    builders: Vec<TransactionBuilder>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut stmt = connection.prepare(&format!(
        "INSERT INTO \"transaction\" (timestamp, type, amount, phone, reference, message, \
            fee, sender_name, recipient_name, new_balance, import_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(import_id) DO NOTHING
         RETURNING {SELECT_COLUMNS}"
    ))?;

    let mut imported = Vec::new();

    for builder in builders {
        if builder.amount < 0 {
            return Err(Error::NegativeAmount(builder.amount));
        }

        let mut rows = stmt.query((
            builder.timestamp.to_offset(UtcOffset::UTC),
            builder.transaction_type,
            builder.amount,
            builder.phone,
            builder.reference,
            builder.message,
            builder.fee,
            builder.sender_name,
            builder.recipient_name,
            builder.new_balance,
            builder.import_id,
        ))?;

        // Conflicting rows are not returned.
        if let Some(row) = rows.next()? {
            imported.push(map_transaction_row(row)?);
        }
    }

    Ok(imported)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get every stored transaction, newest first.
///
/// Ties on the timestamp are broken by ID so the order is stable.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\" ORDER BY timestamp DESC, id DESC"
        ))?
        .query_map([], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get every stored transaction, newest first, with timestamps in the local
/// time of `local_timezone`.
///
/// Calendar dates of the returned timestamps are local dates, which is what
/// the date filters and per-day insights compare against.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name,
/// - or [Error::SqlError] there is some SQL error.
pub fn load_local_transactions(
    local_timezone: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let offset = get_local_offset(local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {local_timezone}");
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })?;

    let transactions = get_all_transactions(connection)?
        .into_iter()
        .map(|transaction| transaction.to_offset(offset))
        .collect();

    Ok(transactions)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                type TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                phone TEXT NOT NULL,
                reference TEXT NOT NULL,
                message TEXT NOT NULL,
                fee INTEGER,
                sender_name TEXT,
                recipient_name TEXT,
                new_balance INTEGER,
                import_id INTEGER UNIQUE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_timestamp ON \"transaction\"(timestamp);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_type ON \"transaction\"(type);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        transaction_type: row.get(2)?,
        amount: row.get(3)?,
        phone: row.get(4)?,
        reference: row.get(5)?,
        message: row.get(6)?,
        fee: row.get(7)?,
        sender_name: row.get(8)?,
        recipient_name: row.get(9)?,
        new_balance: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
