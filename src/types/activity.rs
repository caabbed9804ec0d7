//! Customer activity history records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One classification snapshot of a customer, effective from `activity_at`
///
/// `metrics` is the raw metrics document captured at that moment, either
/// nested (`raw` / `layer1` / `layer2` / `layer3`) or flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub owner_id: String,
    pub customer_id: String,
    /// Unix milliseconds
    pub activity_at: i64,
    pub metrics: Value,
}

impl ActivityRecord {
    pub fn new(owner_id: &str, customer_id: &str, activity_at: i64, metrics: Value) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            customer_id: customer_id.to_string(),
            activity_at,
            metrics,
        }
    }
}
