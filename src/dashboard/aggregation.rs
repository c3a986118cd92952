//! Aggregation of a filtered transaction slice into stats, chart series and insights.
//!
//! Every function here is pure: it takes the already filtered transactions and
//! returns plain data. Ratios guard against division by zero and return 0.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::transaction::{Direction, Transaction, TransactionType};

/// The number of types shown in the volume by type chart.
const TOP_TYPE_COUNT: usize = 10;

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct YearMonth {
    pub year: i32,
    pub month: u8,
}

impl YearMonth {
    pub(crate) fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// Months since year zero, used for month arithmetic.
    fn index(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Formatted as "YYYY-MM".
    pub(crate) fn label(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// The headline numbers shown in the stat cards.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransactionStats {
    pub total_count: usize,
    pub total_volume: i64,
    pub average_amount: f64,
    pub type_count: usize,
    pub money_in: i64,
    pub money_out: i64,
}

pub(crate) fn transaction_stats(transactions: &[Transaction]) -> TransactionStats {
    let total_volume = total_amount(transactions);
    let direction = direction_totals(transactions);
    let type_count = transactions
        .iter()
        .map(|transaction| transaction.transaction_type)
        .collect::<HashSet<_>>()
        .len();

    TransactionStats {
        total_count: transactions.len(),
        total_volume,
        average_amount: average(total_volume, transactions.len()),
        type_count,
        money_in: direction.money_in,
        money_out: direction.money_out,
    }
}

/// Sums saturate so stored amounts can never overflow a total.
fn total_amount(transactions: &[Transaction]) -> i64 {
    transactions
        .iter()
        .fold(0, |total: i64, transaction| total.saturating_add(transaction.amount))
}

fn average(total: i64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Per-type totals in type declaration order, skipping types with no transactions.
fn totals_by_type(transactions: &[Transaction]) -> Vec<(TransactionType, usize, i64)> {
    let mut totals: HashMap<TransactionType, (usize, i64)> = HashMap::new();

    for transaction in transactions {
        let entry = totals.entry(transaction.transaction_type).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(transaction.amount);
    }

    TransactionType::ALL
        .into_iter()
        .filter_map(|transaction_type| {
            totals
                .get(&transaction_type)
                .map(|&(count, amount)| (transaction_type, count, amount))
        })
        .collect()
}

/// The total amount per type, largest first, limited to the top ten.
///
/// Types with equal volume keep their declaration order.
pub(crate) fn volume_by_type(transactions: &[Transaction]) -> Vec<(TransactionType, i64)> {
    let mut volumes: Vec<_> = totals_by_type(transactions)
        .into_iter()
        .map(|(transaction_type, _, amount)| (transaction_type, amount))
        .collect();

    volumes.sort_by(|a, b| b.1.cmp(&a.1));
    volumes.truncate(TOP_TYPE_COUNT);
    volumes
}

/// The number of transactions per type, most frequent first.
pub(crate) fn count_by_type(transactions: &[Transaction]) -> Vec<(TransactionType, usize)> {
    let mut counts: Vec<_> = totals_by_type(transactions)
        .into_iter()
        .map(|(transaction_type, count, _)| (transaction_type, count))
        .collect();

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The transaction count and volume of one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthlyTotal {
    pub month: YearMonth,
    pub count: usize,
    pub amount: i64,
}

/// Count and amount per calendar month, oldest month first.
pub(crate) fn monthly_totals(transactions: &[Transaction]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<YearMonth, (usize, i64)> = BTreeMap::new();

    for transaction in transactions {
        let entry = totals
            .entry(YearMonth::of(transaction.timestamp.date()))
            .or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(transaction.amount);
    }

    totals
        .into_iter()
        .map(|(month, (count, amount))| MonthlyTotal {
            month,
            count,
            amount,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DirectionTotals {
    pub money_in: i64,
    pub money_out: i64,
}

pub(crate) fn direction_totals(transactions: &[Transaction]) -> DirectionTotals {
    transactions
        .iter()
        .fold(DirectionTotals::default(), |mut totals, transaction| {
            match transaction.transaction_type.direction() {
                Direction::In => {
                    totals.money_in = totals.money_in.saturating_add(transaction.amount)
                }
                Direction::Out => {
                    totals.money_out = totals.money_out.saturating_add(transaction.amount)
                }
            }
            totals
        })
}

/// Statistics derived from the current filtered set, shown as insight cards.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Insights {
    pub average_amount: f64,
    /// The calendar day with the most transactions and its count.
    pub most_active_day: Option<(Date, usize)>,
    pub largest_transaction: Option<Transaction>,
    /// The most frequent type and its count.
    pub most_frequent_type: Option<(TransactionType, usize)>,
    /// Change in volume from the first to the last month, as a percentage.
    pub growth_rate: f64,
    pub transactions_per_month: f64,
}

pub(crate) fn insights(transactions: &[Transaction]) -> Insights {
    let total_volume = total_amount(transactions);
    let months = monthly_totals(transactions);

    Insights {
        average_amount: average(total_volume, transactions.len()),
        most_active_day: most_active_day(transactions),
        largest_transaction: largest_transaction(transactions).cloned(),
        most_frequent_type: most_frequent_type(transactions),
        growth_rate: growth_rate(&months),
        transactions_per_month: if months.is_empty() {
            0.0
        } else {
            transactions.len() as f64 / months.len() as f64
        },
    }
}

/// Ties go to the earliest day.
fn most_active_day(transactions: &[Transaction]) -> Option<(Date, usize)> {
    let mut counts: BTreeMap<Date, usize> = BTreeMap::new();

    for transaction in transactions {
        *counts.entry(transaction.timestamp.date()).or_default() += 1;
    }

    counts
        .into_iter()
        .fold(None, |best, (day, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((day, count)),
        })
}

/// Ties go to the transaction that comes first.
fn largest_transaction(transactions: &[Transaction]) -> Option<&Transaction> {
    transactions.iter().fold(None, |best, transaction| match best {
        Some(largest) if largest.amount >= transaction.amount => Some(largest),
        _ => Some(transaction),
    })
}

/// Ties go to the type declared first.
fn most_frequent_type(transactions: &[Transaction]) -> Option<(TransactionType, usize)> {
    totals_by_type(transactions)
        .into_iter()
        .fold(None, |best, (transaction_type, count, _)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((transaction_type, count)),
        })
}

fn growth_rate(months: &[MonthlyTotal]) -> f64 {
    let (Some(first), Some(last)) = (months.first(), months.last()) else {
        return 0.0;
    };

    if months.len() < 2 || first.amount == 0 {
        return 0.0;
    }

    last.amount.saturating_sub(first.amount) as f64 / first.amount as f64 * 100.0
}

/// The response body of the summary API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Count and volume per type.
    pub by_type: Vec<TypeSummary>,
    /// Money spent and received per month.
    pub by_month: Vec<MonthSummary>,
}

/// The count and volume of one transaction type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    /// The transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The number of transactions of this type.
    pub count: usize,
    /// The sum of their amounts.
    pub total_amount: i64,
}

/// Money spent and received in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    /// The month formatted as "YYYY-MM".
    pub month: String,
    /// The volume of outgoing transactions.
    pub total_spent: i64,
    /// The volume of incoming transactions.
    pub total_received: i64,
}

/// Summarize transactions by type and by month for the summary API.
///
/// Only transactions with a positive amount are counted. The monthly summary
/// covers the twelve calendar months ending with the month of `now`.
pub fn summarize(transactions: &[Transaction], now: OffsetDateTime) -> Summary {
    let positive: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.amount > 0)
        .cloned()
        .collect();

    let by_type = totals_by_type(&positive)
        .into_iter()
        .map(|(transaction_type, count, total_amount)| TypeSummary {
            transaction_type,
            count,
            total_amount,
        })
        .collect();

    let current_month = YearMonth::of(now.date()).index();
    let mut by_month: BTreeMap<YearMonth, (i64, i64)> = BTreeMap::new();

    for transaction in &positive {
        let month = YearMonth::of(transaction.timestamp.date());
        let months_ago = current_month - month.index();

        if !(0..12).contains(&months_ago) {
            continue;
        }

        let entry = by_month.entry(month).or_default();
        match transaction.transaction_type.direction() {
            Direction::Out => entry.0 = entry.0.saturating_add(transaction.amount),
            Direction::In => entry.1 = entry.1.saturating_add(transaction.amount),
        }
    }

    Summary {
        by_type,
        by_month: by_month
            .into_iter()
            .map(|(month, (total_spent, total_received))| MonthSummary {
                month: month.label(),
                total_spent,
                total_received,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::transaction::{Transaction, TransactionType};

    use super::{
        YearMonth, count_by_type, direction_totals, insights, monthly_totals, summarize,
        transaction_stats, volume_by_type,
    };

    fn transaction(
        id: i64,
        timestamp: OffsetDateTime,
        transaction_type: TransactionType,
        amount: i64,
    ) -> Transaction {
        Transaction::build(timestamp, transaction_type, amount).finalise(id)
    }

    fn example_transactions() -> Vec<Transaction> {
        vec![
            transaction(
                1,
                datetime!(2025-01-05 09:00 UTC),
                TransactionType::IncomingMoney,
                1000,
            ),
            transaction(
                2,
                datetime!(2025-01-06 09:00 UTC),
                TransactionType::PaymentToCode,
                2000,
            ),
            transaction(
                3,
                datetime!(2025-01-07 09:00 UTC),
                TransactionType::IncomingMoney,
                3000,
            ),
        ]
    }

    #[test]
    fn stats_for_example_set() {
        let stats = transaction_stats(&example_transactions());

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.total_volume, 6000);
        assert_eq!(stats.money_in, 4000);
        assert_eq!(stats.money_out, 2000);
        assert_eq!(stats.average_amount, 2000.0);
        assert_eq!(stats.type_count, 2);
    }

    #[test]
    fn money_in_and_out_sum_to_volume() {
        let transactions: Vec<Transaction> = TransactionType::ALL
            .into_iter()
            .enumerate()
            .map(|(i, transaction_type)| {
                transaction(
                    i as i64,
                    datetime!(2025-03-01 12:00 UTC),
                    transaction_type,
                    (i as i64 + 1) * 1_250,
                )
            })
            .collect();

        let stats = transaction_stats(&transactions);

        assert_eq!(stats.money_in + stats.money_out, stats.total_volume);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2025-01-05 09:00 UTC),
                TransactionType::IncomingMoney,
                i64::MAX,
            ),
            transaction(
                2,
                datetime!(2025-02-05 09:00 UTC),
                TransactionType::IncomingMoney,
                10,
            ),
        ];

        let stats = transaction_stats(&transactions);
        assert_eq!(stats.total_volume, i64::MAX);
        assert_eq!(stats.money_in, i64::MAX);

        let got = insights(&transactions);
        assert!(got.average_amount > 0.0);
        assert!(got.growth_rate < 0.0);

        assert_eq!(volume_by_type(&transactions)[0].1, i64::MAX);

        let summary = summarize(&transactions, datetime!(2025-02-10 12:00 UTC));
        assert_eq!(summary.by_type[0].total_amount, i64::MAX);
        assert_eq!(summary.by_month[0].total_received, i64::MAX);
    }

    #[test]
    fn empty_set_has_zero_averages() {
        let stats = transaction_stats(&[]);
        let got = insights(&[]);

        assert_eq!(stats.average_amount, 0.0);
        assert_eq!(got.average_amount, 0.0);
        assert_eq!(got.transactions_per_month, 0.0);
        assert_eq!(got.growth_rate, 0.0);
        assert_eq!(got.most_active_day, None);
        assert_eq!(got.largest_transaction, None);
        assert_eq!(got.most_frequent_type, None);
    }

    #[test]
    fn volume_by_type_is_sorted_descending() {
        let got = volume_by_type(&example_transactions());

        assert_eq!(
            got,
            vec![
                (TransactionType::IncomingMoney, 4000),
                (TransactionType::PaymentToCode, 2000),
            ]
        );
    }

    #[test]
    fn count_by_type_is_sorted_descending() {
        let mut transactions = example_transactions();
        transactions.push(transaction(
            4,
            datetime!(2025-01-08 09:00 UTC),
            TransactionType::AirtimePayment,
            500,
        ));

        let got = count_by_type(&transactions);

        assert_eq!(
            got,
            vec![
                (TransactionType::IncomingMoney, 2),
                (TransactionType::PaymentToCode, 1),
                (TransactionType::AirtimePayment, 1),
            ]
        );
    }

    #[test]
    fn monthly_totals_are_ascending() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2025-03-10 09:00 UTC),
                TransactionType::BankTransfer,
                300,
            ),
            transaction(
                2,
                datetime!(2025-01-10 09:00 UTC),
                TransactionType::BankTransfer,
                100,
            ),
            transaction(
                3,
                datetime!(2025-01-20 09:00 UTC),
                TransactionType::BankTransfer,
                50,
            ),
        ];

        let got = monthly_totals(&transactions);

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].month.label(), "2025-01");
        assert_eq!((got[0].count, got[0].amount), (2, 150));
        assert_eq!(got[1].month.label(), "2025-03");
        assert_eq!((got[1].count, got[1].amount), (1, 300));
    }

    #[test]
    fn direction_totals_split_deposits_from_payments() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2025-01-10 09:00 UTC),
                TransactionType::BankDeposit,
                700,
            ),
            transaction(
                2,
                datetime!(2025-01-10 09:00 UTC),
                TransactionType::AgentWithdrawal,
                200,
            ),
        ];

        let got = direction_totals(&transactions);

        assert_eq!(got.money_in, 700);
        assert_eq!(got.money_out, 200);
    }

    #[test]
    fn growth_rate_with_one_month_is_zero() {
        let got = insights(&example_transactions());

        assert_eq!(got.growth_rate, 0.0);
        assert_eq!(got.transactions_per_month, 3.0);
    }

    #[test]
    fn growth_rate_compares_first_and_last_month() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2025-01-10 09:00 UTC),
                TransactionType::PaymentToCode,
                1000,
            ),
            transaction(
                2,
                datetime!(2025-02-10 09:00 UTC),
                TransactionType::PaymentToCode,
                5000,
            ),
            transaction(
                3,
                datetime!(2025-03-10 09:00 UTC),
                TransactionType::PaymentToCode,
                500,
            ),
        ];

        let got = insights(&transactions);

        assert_eq!(got.growth_rate, -50.0);
        assert_eq!(got.transactions_per_month, 1.0);
    }

    #[test]
    fn growth_rate_with_zero_first_month_is_zero() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2025-01-10 09:00 UTC),
                TransactionType::PaymentToCode,
                0,
            ),
            transaction(
                2,
                datetime!(2025-02-10 09:00 UTC),
                TransactionType::PaymentToCode,
                5000,
            ),
        ];

        assert_eq!(insights(&transactions).growth_rate, 0.0);
    }

    #[test]
    fn insight_ties_are_broken_deterministically() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2025-01-11 09:00 UTC),
                TransactionType::PaymentToCode,
                3000,
            ),
            transaction(
                2,
                datetime!(2025-01-10 09:00 UTC),
                TransactionType::IncomingMoney,
                3000,
            ),
        ];

        let got = insights(&transactions);

        // Earliest day, first transaction, first declared type.
        assert_eq!(got.most_active_day, Some((time::macros::date!(2025 - 01 - 10), 1)));
        assert_eq!(got.largest_transaction.map(|t| t.id), Some(1));
        assert_eq!(
            got.most_frequent_type,
            Some((TransactionType::IncomingMoney, 1))
        );
    }

    #[test]
    fn most_active_day_counts_transactions() {
        let mut transactions = example_transactions();
        transactions.push(transaction(
            4,
            datetime!(2025-01-07 18:00 UTC),
            TransactionType::AirtimePayment,
            100,
        ));

        let got = insights(&transactions);

        assert_eq!(got.most_active_day, Some((time::macros::date!(2025 - 01 - 07), 2)));
    }

    #[test]
    fn summary_counts_positive_amounts_by_type() {
        let mut transactions = example_transactions();
        transactions.push(transaction(
            4,
            datetime!(2025-01-08 09:00 UTC),
            TransactionType::BankTransfer,
            0,
        ));

        let got = summarize(&transactions, datetime!(2025-02-01 00:00 UTC));

        let by_type: Vec<_> = got
            .by_type
            .iter()
            .map(|summary| (summary.transaction_type, summary.count, summary.total_amount))
            .collect();
        assert_eq!(
            by_type,
            vec![
                (TransactionType::IncomingMoney, 2, 4000),
                (TransactionType::PaymentToCode, 1, 2000),
            ]
        );
    }

    #[test]
    fn summary_by_month_covers_last_twelve_months() {
        let transactions = vec![
            transaction(
                1,
                datetime!(2024-02-15 09:00 UTC),
                TransactionType::PaymentToCode,
                999,
            ),
            transaction(
                2,
                datetime!(2024-03-15 09:00 UTC),
                TransactionType::PaymentToCode,
                100,
            ),
            transaction(
                3,
                datetime!(2025-02-01 09:00 UTC),
                TransactionType::IncomingMoney,
                400,
            ),
            transaction(
                4,
                datetime!(2025-02-02 09:00 UTC),
                TransactionType::AirtimePayment,
                50,
            ),
        ];

        let got = summarize(&transactions, datetime!(2025-02-20 00:00 UTC));

        let by_month: Vec<_> = got
            .by_month
            .iter()
            .map(|summary| {
                (
                    summary.month.as_str(),
                    summary.total_spent,
                    summary.total_received,
                )
            })
            .collect();
        assert_eq!(by_month, vec![("2024-03", 100, 0), ("2025-02", 50, 400)]);
    }

    #[test]
    fn summary_serializes_type_field() {
        let got = summarize(&example_transactions(), datetime!(2025-01-31 00:00 UTC));

        let json = serde_json::to_value(&got).unwrap();

        assert_eq!(json["by_type"][0]["type"], "incoming_money");
        assert_eq!(json["by_month"][0]["month"], "2025-01");
        assert_eq!(json["by_month"][0]["total_received"], 4000);
    }

    #[test]
    fn year_month_label_is_zero_padded() {
        let month = YearMonth::of(time::macros::date!(2025 - 03 - 31));

        assert_eq!(month.label(), "2025-03");
    }
}
