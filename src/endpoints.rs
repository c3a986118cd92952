//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The dashboard with stat cards, charts, insights and the transaction table.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The details modal for a single transaction.
pub const TRANSACTION_DETAILS_VIEW: &str = "/transactions/{transaction_id}";
/// The page for uploading SMS backups and statement files.
pub const IMPORT_VIEW: &str = "/import";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to upload files for importing transactions.
pub const IMPORT: &str = "/api/import";
/// The route for listing transactions as JSON.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for the aggregated summary as JSON.
pub const SUMMARY_API: &str = "/api/summary";
/// The route for downloading the filtered transactions as CSV.
pub const EXPORT: &str = "/api/export";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transactions/{transaction_id}', '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
