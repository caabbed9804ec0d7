//! State classifier
//!
//! Turns one raw per-customer metrics document into a `ClassifiedState`.
//! Base dimension labels are read from the document (missing or empty
//! labels become `_unspecified`), the composite group is computed from the
//! rule table in [`composite`], and layer-3 sub-profiles come from the
//! document or are derived in [`layer3`]. Classification never fails.

pub mod composite;
pub mod layer3;
pub mod metrics;

pub use composite::{composite_group, COMPOSITE_RULES};
pub use metrics::MetricsView;

use crate::types::state::label_or_unspecified;
use crate::types::ClassifiedState;
use crate::utils::time::to_millis;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Classify one customer as of `as_of_ms`
pub fn classify(metrics: &Value, as_of_ms: i64) -> ClassifiedState {
    let view = MetricsView::new(metrics);
    let label = |field: &str| label_or_unspecified(view.str(field)).to_string();

    let mut state = ClassifiedState {
        value_tier: label("valueTier"),
        lifecycle_stage: label("lifecycleStage"),
        journey_stage: label("journeyStage"),
        channel: label("channel"),
        loyalty_stage: label("loyaltyStage"),
        momentum_stage: label("momentumStage"),
        total_spent: view.f64("totalSpent"),
        order_count: view.i64("orderCount"),
        last_order_at: to_millis(view.i64("lastOrderAt")),
        ..Default::default()
    };
    state.ceo_group = composite_group(&state).to_string();
    state.layer3 = layer3::layer3_profiles(&view, &state, as_of_ms);
    state
}

/// Classify a customer → metrics map, fanning out over `threads` workers
///
/// Each worker classifies a disjoint chunk into its own map; the maps are
/// merged on the calling thread.
pub fn classify_customers(
    metrics_by_customer: &HashMap<String, Value>,
    as_of_ms: i64,
    threads: usize,
) -> HashMap<String, ClassifiedState> {
    let entries: Vec<(&String, &Value)> = metrics_by_customer.iter().collect();
    let threads = threads.max(1);

    if threads == 1 || entries.len() < threads * 2 {
        return entries
            .into_iter()
            .map(|(id, metrics)| (id.clone(), classify(metrics, as_of_ms)))
            .collect();
    }

    let chunk_size = entries.len().div_ceil(threads);
    let (sender, receiver) = crossbeam::channel::unbounded();

    let scoped = crossbeam::thread::scope(|scope| {
        for chunk in entries.chunks(chunk_size) {
            let sender = sender.clone();
            scope.spawn(move |_| {
                let classified: HashMap<String, ClassifiedState> = chunk
                    .iter()
                    .map(|(id, metrics)| ((*id).clone(), classify(metrics, as_of_ms)))
                    .collect();
                // Receiver outlives the scope
                let _ = sender.send(classified);
            });
        }
    });
    drop(sender);

    if scoped.is_err() {
        // A worker panicked; classify serially instead of returning a partial map
        debug!("Classification worker failed, falling back to serial classification");
        return entries
            .into_iter()
            .map(|(id, metrics)| (id.clone(), classify(metrics, as_of_ms)))
            .collect();
    }

    let mut states = HashMap::with_capacity(entries.len());
    for partial in receiver.iter() {
        states.extend(partial);
    }
    states
}
