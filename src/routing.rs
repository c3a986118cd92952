//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    api::{get_summary_api, get_transactions_api},
    dashboard::get_dashboard_page,
    endpoints,
    export::export_transactions,
    import::{get_import_page, upload_transactions},
    not_found::get_404_not_found,
    transaction::get_transaction_details,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(
            endpoints::TRANSACTION_DETAILS_VIEW,
            get(get_transaction_details),
        )
        .route(endpoints::IMPORT_VIEW, get(get_import_page));

    let api_routes = Router::new()
        .route(endpoints::IMPORT, post(upload_transactions))
        .route(endpoints::TRANSACTIONS_API, get(get_transactions_api))
        .route(endpoints::SUMMARY_API, get(get_summary_api))
        .route(endpoints::EXPORT, get(export_transactions));

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
