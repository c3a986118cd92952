//! The filter form and the paginated transaction table.

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TYPE_BADGE_STYLE, format_currency,
        format_timestamp,
    },
    pagination::PaginationIndicator,
    transaction::{FilterQuery, Transaction, TransactionType},
};

/// The max number of graphemes to display in the message column before
/// truncating and displaying ellipses.
const MAX_MESSAGE_GRAPHEMES: usize = 48;

/// The ID of the element that filter and pagination requests swap.
pub(super) const DASHBOARD_CONTENT_ID: &str = "dashboard-content";

/// Renders the filter form.
///
/// Every change re-requests the dashboard content, and a newer request
/// replaces any request still in flight.
pub(super) fn filter_form_view(query: &FilterQuery) -> Markup {
    let selected_type = query.transaction_type.as_deref().unwrap_or("all");
    let target = format!("#{DASHBOARD_CONTENT_ID}");

    html! {
        form
            id="filter-form"
            hx-get=(endpoints::DASHBOARD_VIEW)
            hx-target=(target)
            hx-swap="outerHTML"
            hx-trigger="change, keyup changed delay:300ms from:#search, submit"
            hx-sync="this:replace"
            hx-push-url="true"
            hx-target-error="#alert-container"
            class="w-full mb-4 grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-6 gap-4
                p-4 rounded-lg bg-white dark:bg-gray-800 shadow-md"
        {
            div class="lg:col-span-2"
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    id="search"
                    name="search"
                    type="search"
                    placeholder="Message, phone or reference"
                    value=[query.search.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select id="type" name="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="all" selected[selected_type == "all"] { "All types" }

                    @for transaction_type in TransactionType::ALL {
                        option
                            value=(transaction_type.as_str())
                            selected[selected_type == transaction_type.as_str()]
                        {
                            (transaction_type.label())
                        }
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    id="start_date"
                    name="start_date"
                    type="date"
                    value=[query.start_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    id="end_date"
                    name="end_date"
                    type="date"
                    value=[query.end_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="grid grid-cols-2 gap-2"
            {
                div
                {
                    label for="min_amount" class=(FORM_LABEL_STYLE) { "Min" }
                    input
                        id="min_amount"
                        name="min_amount"
                        type="number"
                        min="0"
                        step="1"
                        value=[query.min_amount.as_deref()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="max_amount" class=(FORM_LABEL_STYLE) { "Max" }
                    input
                        id="max_amount"
                        name="max_amount"
                        type="number"
                        min="0"
                        step="1"
                        value=[query.max_amount.as_deref()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div class="lg:col-span-6 flex justify-end gap-4 items-center"
            {
                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Clear filters" }
            }
        }
    }
}

/// The URL of the dashboard at `page` with the filters in `query_string`.
fn page_url(query_string: &str, page: u64) -> String {
    if query_string.is_empty() {
        format!("{}?page={page}", endpoints::DASHBOARD_VIEW)
    } else {
        format!("{}?{query_string}&page={page}", endpoints::DASHBOARD_VIEW)
    }
}

/// The URL of the CSV export of the transactions matching `query_string`.
pub(super) fn export_url(query_string: &str) -> String {
    if query_string.is_empty() {
        endpoints::EXPORT.to_owned()
    } else {
        format!("{}?{query_string}", endpoints::EXPORT)
    }
}

fn format_message(message: &str) -> (String, Option<&str>) {
    let message_length = message.graphemes(true).count();

    if message_length <= MAX_MESSAGE_GRAPHEMES {
        (message.to_owned(), None)
    } else {
        let truncated: String = message
            .graphemes(true)
            .take(MAX_MESSAGE_GRAPHEMES - 3)
            .collect();
        (truncated + "...", Some(message))
    }
}

/// Renders one page of transactions along with pagination and export links.
///
/// `query_string` holds the active filters so that pagination and export
/// links keep them.
pub(super) fn transactions_table_view(
    transactions: &[Transaction],
    filtered_count: usize,
    pagination: &[PaginationIndicator],
    query_string: &str,
) -> Markup {
    html! {
        section id="transactions" class="w-full mx-auto mb-4"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { "Transactions" }

                div class="flex gap-4 items-baseline"
                {
                    span class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        (filtered_count) " matching"
                    }

                    a
                        id="export-link"
                        href=(export_url(query_string))
                        download
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Export CSV"
                    }
                }
            }

            div class="overflow-x-auto rounded-lg shadow-md"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class="px-6 py-3" { "Date" }
                            th scope="col" class="px-6 py-3" { "Type" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            th scope="col" class="px-6 py-3" { "Phone" }
                            th scope="col" class="px-6 py-3" { "Reference" }
                            th scope="col" class="px-6 py-3" { "Message" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            (transaction_row_view(transaction))
                        }

                        @if transactions.is_empty() {
                            tr
                            {
                                td
                                    colspan="6"
                                    data-empty-state="true"
                                    class="px-6 py-4 text-center"
                                {
                                    "No transactions match the current filters."
                                }
                            }
                        }
                    }
                }
            }

            (pagination_view(pagination, query_string))
        }
    }
}

fn transaction_row_view(transaction: &Transaction) -> Markup {
    let (message, tooltip) = format_message(&transaction.message);

    html! {
        tr
            class=(TABLE_ROW_STYLE)
            data-transaction-row="true"
            hx-get=(format_endpoint(endpoints::TRANSACTION_DETAILS_VIEW, transaction.id))
            hx-target="#modal-container"
            hx-target-error="#alert-container"
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.timestamp.to_string())
                {
                    (format_timestamp(transaction.timestamp))
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(TYPE_BADGE_STYLE) { (transaction.transaction_type.label()) }
            }
            td class="px-6 py-4 text-right whitespace-nowrap" { (format_currency(transaction.amount as f64)) }
            td class=(TABLE_CELL_STYLE) { (transaction.phone) }
            td class=(TABLE_CELL_STYLE) { (transaction.reference) }
            td class=(TABLE_CELL_STYLE) title=[tooltip] { (message) }
        }
    }
}

fn pagination_view(pagination: &[PaginationIndicator], query_string: &str) -> Markup {
    let target = format!("#{DASHBOARD_CONTENT_ID}");
    let page_link_style = "block px-3 py-2 rounded hover:bg-gray-100 dark:hover:bg-gray-700";

    html! {
        nav class="pagination flex justify-center mt-4" aria-label="Pagination"
        {
            ul class="flex items-center gap-1 text-sm"
            {
                @for indicator in pagination {
                    @match indicator {
                        PaginationIndicator::CurrPage(page) => {
                            li
                            {
                                span
                                    aria-current="page"
                                    class="block px-3 py-2 rounded bg-blue-600 text-white"
                                {
                                    (page)
                                }
                            }
                        }
                        PaginationIndicator::Page(page) => {
                            li
                            {
                                a
                                    href=(page_url(query_string, *page))
                                    hx-get=(page_url(query_string, *page))
                                    hx-target=(target)
                                    hx-swap="outerHTML"
                                    hx-push-url="true"
                                    class=(page_link_style)
                                {
                                    (page)
                                }
                            }
                        }
                        PaginationIndicator::Ellipsis => {
                            li class="px-3 py-2" { "..." }
                        }
                        PaginationIndicator::BackButton(page) => {
                            li
                            {
                                a
                                    href=(page_url(query_string, *page))
                                    hx-get=(page_url(query_string, *page))
                                    hx-target=(target)
                                    hx-swap="outerHTML"
                                    hx-push-url="true"
                                    class=(page_link_style)
                                {
                                    "Back"
                                }
                            }
                        }
                        PaginationIndicator::NextButton(page) => {
                            li
                            {
                                a
                                    href=(page_url(query_string, *page))
                                    hx-get=(page_url(query_string, *page))
                                    hx-target=(target)
                                    hx-swap="outerHTML"
                                    hx-push-url="true"
                                    class=(page_link_style)
                                {
                                    "Next"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
