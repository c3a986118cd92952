//! Card components for the dashboard's headline numbers.
//!
//! Provides two rows of cards:
//! - Stat cards with totals over the filtered transactions
//! - Insight cards with statistics derived from them

use maud::{Markup, html};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    dashboard::aggregation::{Insights, TransactionStats},
    html::{format_count, format_currency},
};

const DAY_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// Renders the six stat cards.
pub(super) fn stat_cards_view(stats: &TransactionStats) -> Markup {
    let cards = [
        ("Total Transactions", format_count(stats.total_count)),
        ("Total Volume", format_currency(stats.total_volume as f64)),
        ("Average Amount", format_currency(stats.average_amount)),
        ("Transaction Types", format_count(stats.type_count)),
        ("Money In", format_currency(stats.money_in as f64)),
        ("Money Out", format_currency(stats.money_out as f64)),
    ];

    html! {
        section id="stat-cards" class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-2 md:grid-cols-3 xl:grid-cols-6 gap-4"
            {
                @for (title, value) in &cards {
                    (card(title, value, None, None))
                }
            }
        }
    }
}

/// Renders the six insight cards.
pub(super) fn insight_cards_view(insights: &Insights) -> Markup {
    let most_active_day = match insights.most_active_day {
        Some((day, count)) => (
            format_day(day),
            Some(format!("{} transactions", format_count(count))),
        ),
        None => ("-".to_owned(), None),
    };

    let largest_transaction = match &insights.largest_transaction {
        Some(transaction) => (
            format_currency(transaction.amount as f64),
            Some(transaction.transaction_type.label().to_owned()),
        ),
        None => ("-".to_owned(), None),
    };

    let most_common_type = match insights.most_frequent_type {
        Some((transaction_type, count)) => (
            transaction_type.label().to_owned(),
            Some(format!("{} transactions", format_count(count))),
        ),
        None => ("-".to_owned(), None),
    };

    let growth_style = if insights.growth_rate >= 0.0 {
        "text-green-600 dark:text-green-400"
    } else {
        "text-red-600 dark:text-red-400"
    };

    html! {
        section id="insights" class="w-full mx-auto mb-4"
        {
            h3 class="text-xl font-semibold mb-4" { "Insights" }

            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-4"
            {
                (card(
                    "Average Transaction Size",
                    &format_currency(insights.average_amount),
                    None,
                    None,
                ))
                (card(
                    "Most Active Day",
                    &most_active_day.0,
                    most_active_day.1.as_deref(),
                    None,
                ))
                (card(
                    "Largest Transaction",
                    &largest_transaction.0,
                    largest_transaction.1.as_deref(),
                    None,
                ))
                (card(
                    "Most Common Type",
                    &most_common_type.0,
                    most_common_type.1.as_deref(),
                    None,
                ))
                (card(
                    "Monthly Growth Rate",
                    &format_growth_rate(insights.growth_rate),
                    Some("First vs last month volume"),
                    Some(growth_style),
                ))
                (card(
                    "Transactions per Month",
                    &format!("{:.1}", insights.transactions_per_month),
                    None,
                    None,
                ))
            }
        }
    }
}

fn card(title: &str, value: &str, caption: Option<&str>, value_style: Option<&str>) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h4 class="text-sm font-medium text-gray-500 dark:text-gray-400 mb-2" { (title) }

            p class={ "text-2xl font-bold " (value_style.unwrap_or_default()) }
            {
                (value)
            }

            @if let Some(caption) = caption {
                p class="text-xs text-gray-500 dark:text-gray-400 mt-1" { (caption) }
            }
        }
    }
}

fn format_day(day: Date) -> String {
    day.format(DAY_FORMAT).unwrap_or_else(|_| day.to_string())
}

/// Formats a growth rate with one decimal, avoiding "-0.0%".
fn format_growth_rate(rate: f64) -> String {
    if rate.abs() < 0.05 {
        "0.0%".to_owned()
    } else {
        format!("{rate:.1}%")
    }
}
