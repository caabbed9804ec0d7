//! Trend formatters
//!
//! Plotly output draws one line per raw counter net across the series.

use super::utils::{export_json, format_change, format_money, format_number, format_signed};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::types::visualisation::{PlotlyChart, PlotlyLayout, PlotlyTrace};
use crate::types::TrendReport;

pub fn format_trend(report: &TrendReport, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Console => Ok(console_trend(report)),
        OutputFormat::Json => export_json(report),
        OutputFormat::Plotly => export_json(&trend_chart(report)),
    }
}

/// Line chart of per-period nets
pub fn trend_chart(report: &TrendReport) -> PlotlyChart {
    let periods: Vec<String> = report
        .snapshots
        .iter()
        .map(|s| s.period_key.clone())
        .collect();
    let series = |name: &str, value: fn(&crate::types::DeltaDocument) -> f64| {
        PlotlyTrace::line(
            periods.clone(),
            report.snapshots.iter().map(value).collect(),
            name,
        )
    };

    PlotlyChart {
        data: vec![
            series("Net customers", |s| s.flows.raw.total_customers.net() as f64),
            series("New customers", |s| s.flows.raw.new_customers_in_period.inflow as f64),
            series("Active customers", |s| s.flows.raw.active_in_period.inflow as f64),
        ],
        layout: PlotlyLayout::basic(
            &format!("{} trend ({})", report.report_key, report.owner_id),
            "Period",
            "Customers",
        ),
    }
}

fn console_trend(report: &TrendReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n📈 {} TREND FOR {} ({} → {})\n",
        report.report_key, report.owner_id, report.from_period_key, report.to_period_key
    ));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if report.snapshots.is_empty() {
        output.push_str("No snapshots in range.\n");
        return output;
    }

    output.push_str(&format!(
        "{:<12} {:>12} {:>10} {:>10} {:>16}\n",
        "Period", "Net cust.", "New", "Active", "Net LTV"
    ));
    output.push_str(&format!("{}\n", "-".repeat(64)));
    for snapshot in &report.snapshots {
        let raw = &snapshot.flows.raw;
        output.push_str(&format!(
            "{:<12} {:>12} {:>10} {:>10} {:>16}\n",
            snapshot.period_key,
            format_signed(raw.total_customers.net()),
            format_number(raw.new_customers_in_period.inflow),
            format_number(raw.active_in_period.inflow),
            format_money(raw.total_ltv.net())
        ));
    }

    if let Some(comparison) = &report.comparison {
        output.push_str(&format!(
            "\n🔍 {} vs {}:\n",
            comparison.current_period_key, comparison.previous_period_key
        ));
        for (metric, change) in &comparison.metrics {
            output.push_str(&format!(
                "  {:<22} {:>14} {:>14} {:>10}\n",
                metric,
                format_money(change.current),
                format_money(change.previous),
                format_change(change.change_pct)
            ));
        }
    }

    output
}
