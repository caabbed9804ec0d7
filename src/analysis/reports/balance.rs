//! Balance formatters

use super::utils::{export_json, format_money, format_number};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::types::{Balance, BalanceSource, Dimension};
use crate::utils::math::safe_percentage;
use crate::utils::time::format_local_datetime;

pub fn format_balance(balance: &Balance, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Console => Ok(console_balance(balance)),
        OutputFormat::Json | OutputFormat::Plotly => export_json(balance),
    }
}

fn describe_source(source: &BalanceSource) -> String {
    match source {
        BalanceSource::Direct { customers } => {
            format!("direct replay of {} customers", format_number(*customers as i64))
        }
        BalanceSource::Summed {
            report_key,
            from_period_key,
            to_period_key,
            snapshot_count,
        } => format!(
            "sum of {} {} snapshots ({} → {})",
            snapshot_count, report_key, from_period_key, to_period_key
        ),
        BalanceSource::Empty => "no snapshots found (zero balance)".to_string(),
    }
}

fn console_balance(balance: &Balance) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n💰 BALANCE FOR {}\n", balance.owner_id));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    output.push_str(&format!("As of:   {}\n", format_local_datetime(balance.as_of)));
    output.push_str(&format!("Source:  {}\n\n", describe_source(&balance.source)));

    let raw = &balance.raw;
    output.push_str(&format!("Total customers:      {:>14}\n", format_number(raw.total_customers)));
    output.push_str(&format!("New in period:        {:>14}\n", format_number(raw.new_customers_in_period)));
    output.push_str(&format!("Active in period:     {:>14}\n", format_number(raw.active_in_period)));
    output.push_str(&format!("Reactivation value:   {:>14}\n", format_money(raw.reactivation_value)));
    output.push_str(&format!("Total LTV:            {:>14}\n", format_money(raw.total_ltv)));

    for dimension in Dimension::ALL {
        let Some(groups) = balance.groups.get(&dimension).filter(|g| !g.is_empty()) else {
            continue;
        };
        let total: i64 = groups.values().sum();

        output.push_str(&format!("\n📊 {}\n", dimension.key()));
        output.push_str(&format!(
            "  {:<20} {:>10} {:>8} {:>16}\n",
            "Group", "Customers", "%", "LTV"
        ));
        output.push_str(&format!("  {}\n", "-".repeat(57)));

        let mut rows: Vec<(&String, &i64)> = groups.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (group, count) in rows {
            output.push_str(&format!(
                "  {:<20} {:>10} {:>7.2}% {:>16}\n",
                group,
                format_number(*count),
                safe_percentage(count.unsigned_abs() as usize, total.unsigned_abs() as usize),
                format_money(balance.group_ltv(dimension, group))
            ));
        }
    }

    for (kind, profile) in &balance.layer3 {
        if profile.is_empty() {
            continue;
        }
        output.push_str(&format!("\n🧩 layer3.{}\n", kind.key()));
        for (sub_dimension, groups) in profile {
            let summary: Vec<String> = groups
                .iter()
                .map(|(group, count)| format!("{} {}", group, format_number(*count)))
                .collect();
            output.push_str(&format!("  {:<26} {}\n", sub_dimension, summary.join(", ")));
        }
    }

    output
}
