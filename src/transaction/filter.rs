//! Filtering a transaction collection by search text, type, date and amount.

use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::transaction::{Transaction, TransactionType};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The raw filter values as they arrive in a query string.
///
/// Every field is kept as text so that empty and malformed inputs from the
/// filter form do not reject the request. Use [FilterQuery::criteria] to get
/// the validated criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Free text matched against the message, phone and reference.
    #[serde(default)]
    pub search: Option<String>,
    /// The snake_case name of a transaction type, or "all".
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    /// The earliest calendar date to include, formatted as YYYY-MM-DD.
    #[serde(default)]
    pub start_date: Option<String>,
    /// The latest calendar date to include, formatted as YYYY-MM-DD.
    #[serde(default)]
    pub end_date: Option<String>,
    /// The smallest amount to include.
    #[serde(default)]
    pub min_amount: Option<String>,
    /// The largest amount to include.
    #[serde(default)]
    pub max_amount: Option<String>,
}

/// The predicates a transaction must satisfy to be included in a filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Lowercase search text, empty matches everything.
    pub search: String,
    /// Only include this type, `None` includes all types.
    pub transaction_type: Option<TransactionType>,
    /// Inclusive lower bound on the transaction's calendar date.
    pub start_date: Option<Date>,
    /// Inclusive upper bound on the transaction's calendar date.
    pub end_date: Option<Date>,
    /// Inclusive lower bound on the amount.
    pub min_amount: i64,
    /// Inclusive upper bound on the amount, `None` is unbounded.
    pub max_amount: Option<i64>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            transaction_type: None,
            start_date: None,
            end_date: None,
            min_amount: 0,
            max_amount: None,
        }
    }
}

impl FilterQuery {
    /// Convert the raw values into criteria.
    ///
    /// Empty or malformed values fall back to their defaults: no search, all
    /// types, no date bounds, a minimum of zero and no maximum.
    pub fn criteria(&self) -> FilterCriteria {
        let search = self
            .search
            .as_deref()
            .map(|search| search.trim().to_lowercase())
            .unwrap_or_default();

        let transaction_type = self
            .transaction_type
            .as_deref()
            .and_then(|name| name.parse::<TransactionType>().ok());

        FilterCriteria {
            search,
            transaction_type,
            start_date: parse_date(self.start_date.as_deref()),
            end_date: parse_date(self.end_date.as_deref()),
            min_amount: parse_amount(self.min_amount.as_deref()).unwrap_or(0),
            max_amount: parse_amount(self.max_amount.as_deref()),
        }
    }

    /// The query string for these filter values, omitting empty fields.
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<(&str, &str)> = [
            ("search", &self.search),
            ("type", &self.transaction_type),
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("min_amount", &self.min_amount),
            ("max_amount", &self.max_amount),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(value) if !value.is_empty() => Some((key, value)),
            _ => None,
        })
        .collect();

        serde_urlencoded::to_string(pairs)
            .inspect_err(|error| tracing::error!("could not encode filter query: {error}"))
            .unwrap_or_default()
    }
}

fn parse_date(text: Option<&str>) -> Option<Date> {
    let text = text?.trim();

    if text.is_empty() {
        return None;
    }

    Date::parse(text, DATE_FORMAT)
        .inspect_err(|error| tracing::debug!("ignoring malformed date filter {text:?}: {error}"))
        .ok()
}

/// Parses an amount bound, accepting fractional input by rounding down.
fn parse_amount(text: Option<&str>) -> Option<i64> {
    let text = text?.trim();

    if text.is_empty() {
        return None;
    }

    let value: f64 = text.parse().ok()?;

    if value.is_finite() {
        Some(value.floor() as i64)
    } else {
        None
    }
}

impl FilterCriteria {
    /// Whether `transaction` satisfies every predicate.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_search(transaction)
            && self.matches_type(transaction)
            && self.matches_date(transaction)
            && self.matches_amount(transaction)
    }

    fn matches_search(&self, transaction: &Transaction) -> bool {
        self.search.is_empty()
            || transaction.message.to_lowercase().contains(&self.search)
            || transaction.phone.to_lowercase().contains(&self.search)
            || transaction.reference.to_lowercase().contains(&self.search)
    }

    fn matches_type(&self, transaction: &Transaction) -> bool {
        self.transaction_type
            .is_none_or(|transaction_type| transaction.transaction_type == transaction_type)
    }

    fn matches_date(&self, transaction: &Transaction) -> bool {
        let date = transaction.timestamp.date();

        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }

    fn matches_amount(&self, transaction: &Transaction) -> bool {
        transaction.amount >= self.min_amount
            && self.max_amount.is_none_or(|max| transaction.amount <= max)
    }
}

/// Get the transactions that satisfy all of the `criteria`, keeping their order.
pub fn filter_transactions(
    transactions: &[Transaction],
    criteria: &FilterCriteria,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| criteria.matches(transaction))
        .cloned()
        .collect()
}
