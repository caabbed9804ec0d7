//! Delta snapshot formatters

use super::utils::{export_json, format_money, format_number, format_signed};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::types::{DeltaDocument, Dimension, Flow, FlowValue, GroupFlows, ProfileKind};
use crate::utils::time::format_local_datetime;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

pub fn format_delta(document: &DeltaDocument, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Console => Ok(console_delta(document)),
        OutputFormat::Json | OutputFormat::Plotly => export_json(document),
    }
}

pub fn format_deltas(documents: &[DeltaDocument], format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Console => {
            if documents.is_empty() {
                return Ok("No periods computed.\n".to_string());
            }
            Ok(documents.iter().map(console_delta).collect::<Vec<_>>().join("\n"))
        }
        OutputFormat::Json | OutputFormat::Plotly => export_json(&documents),
    }
}

fn count_row(output: &mut String, name: &str, flow: &Flow<i64>) {
    output.push_str(&format!(
        "  {:<26} {:>12} {:>12} {:>12}\n",
        name,
        format_number(flow.inflow),
        format_number(flow.out),
        format_signed(flow.net())
    ));
}

fn money_row(output: &mut String, name: &str, flow: &Flow<f64>) {
    output.push_str(&format!(
        "  {:<26} {:>12} {:>12} {:>12}\n",
        name,
        format_money(flow.inflow),
        format_money(flow.out),
        format_money(flow.net())
    ));
}

fn group_rows<T: FlowValue>(
    output: &mut String,
    groups: &GroupFlows<T>,
    row: fn(&mut String, &str, &Flow<T>),
) {
    for (group, flow) in groups {
        row(output, group, flow);
    }
}

fn console_delta(document: &DeltaDocument) -> String {
    let flows = &document.flows;
    let mut output = String::new();

    output.push_str(&format!(
        "\n📦 {} {} ({})\n",
        document.report_key, document.period_key, document.owner_id
    ));
    output.push_str(RULE);
    if document.computed_at > 0 {
        output.push_str(&format!(
            "Computed at: {}\n",
            format_local_datetime(document.computed_at * 1000)
        ));
    }
    if !document.content_hash.is_empty() {
        output.push_str(&format!("Content hash: {}\n", document.content_hash));
    }

    output.push_str(&format!(
        "\n  {:<26} {:>12} {:>12} {:>12}\n",
        "Counter", "In", "Out", "Net"
    ));
    output.push_str(&format!("  {}\n", "-".repeat(65)));
    count_row(&mut output, "totalCustomers", &flows.raw.total_customers);
    count_row(&mut output, "newCustomersInPeriod", &flows.raw.new_customers_in_period);
    count_row(&mut output, "activeInPeriod", &flows.raw.active_in_period);
    money_row(&mut output, "reactivationValue", &flows.raw.reactivation_value);
    money_row(&mut output, "totalLTV", &flows.raw.total_ltv);

    for dimension in Dimension::ALL {
        let counts = flows.counts(dimension);
        if counts.is_empty() {
            continue;
        }
        output.push_str(&format!("\n🔀 {}\n", dimension.key()));
        group_rows(&mut output, counts, count_row);

        let ltv = flows.ltv(dimension);
        if !ltv.is_empty() {
            output.push_str("  LTV:\n");
            group_rows(&mut output, ltv, money_row);
        }
    }

    for kind in ProfileKind::ALL {
        let profile = flows.profile(kind);
        if profile.is_empty() {
            continue;
        }
        output.push_str(&format!("\n🧩 layer3.{}\n", kind.key()));
        for (sub_dimension, groups) in profile {
            output.push_str(&format!("  {}:\n", sub_dimension));
            for (group, flow) in groups {
                count_row(&mut output, &format!("  {}", group), flow);
            }
        }
    }

    output
}
