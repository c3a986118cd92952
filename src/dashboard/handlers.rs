//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for the dashboard page and its htmx content fragment
//! - HTML view functions for rendering the dashboard UI
//! - State and query types used by the handler

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    dashboard::{
        aggregation::{insights, transaction_stats},
        cards::{insight_cards_view, stat_cards_view},
        charts::{charts_view, dashboard_charts},
        tables::{DASHBOARD_CONTENT_ID, filter_form_view, transactions_table_view},
    },
    endpoints,
    html::{ECHARTS_SCRIPT, HeadElement, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    pagination::{
        PaginationConfig, clamp_page, create_pagination_indicators, page_count, page_slice,
    },
    transaction::{FilterQuery, Transaction, filter_transactions, load_local_transactions},
};

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection, timezone information and the
/// pagination config required by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for loading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Africa/Kigali".
    pub local_timezone: String,
    /// The config that controls the size of the transaction table.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The page of the transaction table to show.
///
/// Kept as text so that a malformed page number shows the first page rather
/// than rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// The 1-based page number.
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> Option<u64> {
        self.page.as_deref()?.trim().parse().ok()
    }
}

/// Display the dashboard for the transactions matching the filters in the query string.
///
/// Requests made by htmx get just the dashboard content so that the filter
/// form keeps its focus, other requests get the full page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    HxRequest(is_htmx_request): HxRequest,
    Query(filter_query): Query<FilterQuery>,
    Query(page_query): Query<PageQuery>,
) -> Result<Response, Response> {
    let into_error_response = |error: Error| {
        if is_htmx_request {
            error.into_alert_response()
        } else {
            error.into_response()
        }
    };

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| into_error_response(Error::DatabaseLockError))?;

        load_local_transactions(&state.local_timezone, &connection)
            .inspect_err(|error| tracing::error!("could not load transactions: {error}"))
            .map_err(into_error_response)?
    };

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view(NavBar::new(endpoints::DASHBOARD_VIEW)).into_response());
    }

    let criteria = filter_query.criteria();
    let filtered = filter_transactions(&transactions, &criteria);
    tracing::debug!(
        "showing {} of {} transactions for {criteria:?}",
        filtered.len(),
        transactions.len()
    );

    let content = dashboard_content_view(
        &filtered,
        &filter_query,
        page_query.page(),
        &state.pagination_config,
    );

    if is_htmx_request {
        Ok(content.into_response())
    } else {
        Ok(dashboard_view(NavBar::new(endpoints::DASHBOARD_VIEW), &filter_query, &content)
            .into_response())
    }
}

/// Renders everything that changes when the filters change: cards, charts,
/// insights and the current page of the table.
fn dashboard_content_view(
    filtered: &[Transaction],
    filter_query: &FilterQuery,
    requested_page: Option<u64>,
    pagination_config: &PaginationConfig,
) -> Markup {
    let stats = transaction_stats(filtered);
    let insights = insights(filtered);
    let charts = dashboard_charts(filtered);

    let page_count = page_count(filtered.len(), pagination_config.page_size);
    let page = clamp_page(requested_page, page_count);
    let rows = page_slice(filtered, page, pagination_config.page_size);
    let pagination = create_pagination_indicators(page, page_count, pagination_config.max_pages);
    let query_string = filter_query.to_query_string();

    html!(
        div
            id=(DASHBOARD_CONTENT_ID)
            class="w-full"
        {
            (stat_cards_view(&stats))
            (charts_view(&charts))
            (insight_cards_view(&insights))
            (transactions_table_view(rows, filtered.len(), &pagination, &query_string))
        }
    )
}

/// Renders the dashboard page when no transaction data exists.
fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let import_link = link(endpoints::IMPORT_VIEW, "importing");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you add some transactions.
                You can add transactions by " (import_link) " an SMS backup
                or a MoMo CSV statement."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn dashboard_view(nav_bar: NavBar, filter_query: &FilterQuery, content: &Markup) -> Markup {
    let nav_bar = nav_bar.into_html();

    let page = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (filter_form_view(filter_query))
            (content)
        }
    );

    let scripts = [HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned())];

    base("Dashboard", &scripts, &page)
}
