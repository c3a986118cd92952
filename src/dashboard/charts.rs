//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations for transaction data:
//! - **Volume by Type**: Bar chart of the ten largest types by volume
//! - **Type Distribution**: Pie chart of the transaction count per type
//! - **Monthly Trend**: Transaction count and volume per month on two y axes
//! - **Money Flow**: Doughnut chart of money in vs money out
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    datatype::DataPointItem,
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::{Bar, Line, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::{count_by_type, direction_totals, monthly_totals, volume_by_type},
    transaction::Transaction,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Build all four dashboard charts for the filtered transactions.
pub(super) fn dashboard_charts(transactions: &[Transaction]) -> Vec<DashboardChart> {
    vec![
        DashboardChart {
            id: "volume-by-type-chart",
            options: volume_by_type_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "type-distribution-chart",
            options: type_distribution_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "monthly-trend-chart",
            options: monthly_trend_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "money-flow-chart",
            options: money_flow_chart(transactions).to_string(),
        },
    ]
}

/// Renders the chart containers followed by the script that draws them.
///
/// The script runs inline rather than on `DOMContentLoaded` so that charts
/// are redrawn when htmx swaps in a new dashboard fragment.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded bg-white dark:bg-gray-800 p-2"
                    {}
                }
            }

            script { (charts_script(charts)) }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
fn charts_script(charts: &[DashboardChart]) -> PreEscaped<String> {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom || typeof echarts === 'undefined') {{
                        return;
                    }}
                    const isDarkMode = window.matchMedia('(prefers-color-scheme: dark)').matches;
                    const chart = echarts.init(chartDom, isDarkMode ? 'dark' : null);
                    const option = {};
                    option.backgroundColor = 'transparent';
                    chart.setOption(option);

                    window.addEventListener('resize', () => chart.resize());
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    PreEscaped(script_content)
}

fn volume_by_type_chart(transactions: &[Transaction]) -> Chart {
    let volumes = volume_by_type(transactions);
    let labels: Vec<String> = volumes
        .iter()
        .map(|(transaction_type, _)| transaction_type.label().to_owned())
        .collect();
    let values: Vec<f64> = volumes.iter().map(|(_, amount)| *amount as f64).collect();

    Chart::new()
        .title(Title::new().text("Volume by Type").subtext("Top ten types"))
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(labels)
                .axis_label(AxisLabel::new().rotate(30)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Volume").data(values))
}

fn type_distribution_chart(transactions: &[Transaction]) -> Chart {
    let data: Vec<DataPointItem> = count_by_type(transactions)
        .into_iter()
        .map(|(transaction_type, count)| {
            DataPointItem::new(count as f64).name(transaction_type.label())
        })
        .collect();

    Chart::new()
        .title(Title::new().text("Type Distribution").subtext("Number of transactions"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom(0))
        .series(Pie::new().name("Transactions").radius("60%").data(data))
}

fn monthly_trend_chart(transactions: &[Transaction]) -> Chart {
    let months = monthly_totals(transactions);
    let labels: Vec<String> = months.iter().map(|total| total.month.label()).collect();
    let counts: Vec<f64> = months.iter().map(|total| total.count as f64).collect();
    let amounts: Vec<f64> = months.iter().map(|total| total.amount as f64).collect();

    Chart::new()
        .title(Title::new().text("Monthly Trend"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Cross)),
        )
        .legend(Legend::new().top("1%").right("4%"))
        .grid(default_grid().top(70))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value).name("Transactions"))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Amount")
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Transactions").data(counts))
        .series(Line::new().name("Amount").y_axis_index(1).data(amounts))
}

fn money_flow_chart(transactions: &[Transaction]) -> Chart {
    let totals = direction_totals(transactions);

    Chart::new()
        .title(Title::new().text("Money Flow"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom(0))
        .series(
            Pie::new()
                .name("Money Flow")
                .radius(vec!["40%", "70%"])
                .data(vec![
                    DataPointItem::new(totals.money_in as f64).name("Deposits & Incoming"),
                    DataPointItem::new(totals.money_out as f64).name("Payments & Outgoing"),
                ]),
        )
}

fn default_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const formatter = new Intl.NumberFormat('en-US', { maximumFractionDigits: 0 });
            return (number) ? 'RWF ' + formatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
