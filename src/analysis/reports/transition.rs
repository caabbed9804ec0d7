//! Transition matrix and group change formatters

use super::utils::{export_json, format_number};
use super::OutputFormat;
use crate::analysis::transition::TransitionAnalyser;
use crate::errors::AppResult;
use crate::types::visualisation::{
    PlotlyLayout, PlotlySankeyChart, PlotlySankeyLinks, PlotlySankeyNodes, PlotlySankeyTrace,
};
use crate::types::{GroupChange, GroupChanges, SankeyData, TransitionMatrix};
use std::collections::{BTreeSet, HashMap};

pub fn format_transition_matrix(
    matrix: &TransitionMatrix,
    format: &OutputFormat,
) -> AppResult<String> {
    match format {
        OutputFormat::Console => Ok(console_matrix(matrix)),
        OutputFormat::Json => export_json(matrix),
        OutputFormat::Plotly => export_json(&sankey_chart(matrix)),
    }
}

pub fn format_group_changes(changes: &GroupChanges, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Console => Ok(console_group_changes(changes)),
        OutputFormat::Json | OutputFormat::Plotly => export_json(changes),
    }
}

/// Plotly Sankey trace; links reference nodes by position
pub fn sankey_chart(matrix: &TransitionMatrix) -> PlotlySankeyChart {
    let data: SankeyData = matrix
        .sankey
        .clone()
        .unwrap_or_else(|| TransitionAnalyser::sankey(&matrix.matrix));

    let index: HashMap<&str, usize> = data
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();

    let mut link = PlotlySankeyLinks {
        source: Vec::with_capacity(data.links.len()),
        target: Vec::with_capacity(data.links.len()),
        value: Vec::with_capacity(data.links.len()),
    };
    for l in &data.links {
        if let (Some(&source), Some(&target)) =
            (index.get(l.source.as_str()), index.get(l.target.as_str()))
        {
            link.source.push(source);
            link.target.push(target);
            link.value.push(l.value);
        }
    }

    PlotlySankeyChart {
        data: vec![PlotlySankeyTrace {
            trace_type: "sankey".to_string(),
            orientation: "h".to_string(),
            node: PlotlySankeyNodes {
                label: data.nodes.iter().map(|n| n.label.clone()).collect(),
                pad: 15,
                thickness: 20,
            },
            link,
        }],
        layout: PlotlyLayout::flow(&format!(
            "{} transitions {} → {}",
            matrix.dimension.key(),
            matrix.from_period_key,
            matrix.to_period_key
        )),
    }
}

fn console_matrix(matrix: &TransitionMatrix) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n🔄 {} TRANSITIONS ({} {} → {})\n",
        matrix.dimension.key(),
        matrix.period_type.as_str(),
        matrix.from_period_key,
        matrix.to_period_key
    ));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    output.push_str(&format!(
        "Participants: {}   exits: {}   entries: {}\n\n",
        format_number(matrix.participants as i64),
        format_number(matrix.from_only as i64),
        format_number(matrix.to_only as i64)
    ));

    if matrix.matrix.is_empty() {
        output.push_str("No customers present at both points.\n");
        return output;
    }

    let columns: BTreeSet<&String> = matrix.matrix.values().flat_map(|row| row.keys()).collect();
    let width = columns
        .iter()
        .map(|c| c.len())
        .chain(matrix.matrix.keys().map(|k| k.len()))
        .max()
        .unwrap_or(8)
        .max(8);

    output.push_str(&format!("{:<width$}", "from \\ to", width = width + 2));
    for column in &columns {
        output.push_str(&format!(" {:>width$}", column, width = width));
    }
    output.push('\n');

    for (from_group, row) in &matrix.matrix {
        output.push_str(&format!("{:<width$}", from_group, width = width + 2));
        for column in &columns {
            let count = row.get(*column).copied().unwrap_or(0);
            output.push_str(&format!(" {:>width$}", format_number(count), width = width));
        }
        output.push('\n');
    }

    output.push_str("\nConversion rates:\n");
    for (from_group, row) in &matrix.conversion_rates {
        for (to_group, rate) in row {
            output.push_str(&format!(
                "  {:<20} → {:<20} {:>7.2}%\n",
                from_group,
                to_group,
                rate * 100.0
            ));
        }
    }

    output
}

fn change_section(output: &mut String, title: &str, total: i64, changes: &[GroupChange]) {
    output.push_str(&format!("\n{} ({})\n", title, format_number(total)));
    if changes.is_empty() {
        output.push_str("  none\n");
        return;
    }
    for change in changes {
        output.push_str(&format!(
            "  {:<20} → {:<20} {:>10}\n",
            change.from,
            change.to,
            format_number(change.count)
        ));
    }
}

fn console_group_changes(changes: &GroupChanges) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n↕️  {} GROUP CHANGES ({} {} → {})\n",
        changes.dimension.key(),
        changes.period_type.as_str(),
        changes.from_period_key,
        changes.to_period_key
    ));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    change_section(&mut output, "⬆️  Upgraded", changes.upgraded_total(), &changes.upgraded);
    change_section(&mut output, "⬇️  Downgraded", changes.downgraded_total(), &changes.downgraded);
    change_section(&mut output, "➡️  Unchanged", changes.unchanged_total(), &changes.unchanged);

    output
}
