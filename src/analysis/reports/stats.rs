//! Database statistics formatter

use super::utils::{export_json, format_number};
use super::OutputFormat;
use crate::database::DatabaseStats;
use crate::errors::AppResult;
use crate::utils::time::format_local_datetime;

/// Format database statistics
pub fn format_database_stats(stats: &DatabaseStats, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Console => {
            let mut output = String::new();
            output.push_str("\n📊 DATABASE STATISTICS\n");
            output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

            output.push_str(&format!(
                "Activity records:    {}\n",
                format_number(stats.activity_records as i64)
            ));
            output.push_str(&format!(
                "Distinct customers:  {}\n",
                format_number(stats.distinct_customers as i64)
            ));
            output.push_str(&format!("Owners:              {}\n", stats.owners));
            if let (Some(earliest), Some(latest)) =
                (stats.earliest_activity_at, stats.latest_activity_at)
            {
                output.push_str(&format!(
                    "Activity span:       {} → {}\n",
                    format_local_datetime(earliest),
                    format_local_datetime(latest)
                ));
            }

            output.push_str(&format!(
                "\nSnapshots:           {}\n",
                format_number(stats.snapshots as i64)
            ));
            for (report_key, count, pct) in &stats.snapshots_by_report {
                output.push_str(&format!(
                    "  {:<18} {:>10} ({:.1}%)\n",
                    report_key,
                    format_number(*count as i64),
                    pct
                ));
            }

            output.push_str(&format!(
                "\nDirty periods:       {} pending, {} processed\n",
                format_number(stats.dirty_pending as i64),
                format_number(stats.dirty_processed as i64)
            ));
            if stats.has_pending_work() {
                output.push_str("⏳ Run the worker to recompute pending periods\n");
            }

            Ok(output)
        }
        OutputFormat::Json | OutputFormat::Plotly => export_json(stats),
    }
}
