//! Dashboard module
//!
//! Provides the analytics page for the filtered transactions: stat cards,
//! charts, insights and a paginated table. The aggregation functions are also
//! used by the summary API.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod tables;

pub use aggregation::summarize;
pub use handlers::get_dashboard_page;
