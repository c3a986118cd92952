//! Mobile money transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its closed `TransactionType` and the `TransactionBuilder`
//! - Database functions for storing and loading transactions
//! - The filter evaluator shared by the dashboard, the JSON API and the CSV export
//! - The details modal for a single transaction

mod core;
mod details;
mod filter;
mod transaction_type;

pub use core::{
    Transaction, TransactionBuilder, count_transactions, create_transaction_table,
    get_transaction, import_transactions, load_local_transactions,
};
pub use details::get_transaction_details;
pub use filter::{FilterQuery, filter_transactions};
pub use transaction_type::{Direction, TransactionType};

#[cfg(test)]
pub use core::{create_transaction, get_all_transactions};
