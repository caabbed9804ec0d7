//! Composite business group ("CEO group")
//!
//! An ordered rule table evaluated top to bottom; the first matching rule
//! names the group and customers matching none fall into `_other`.

use crate::types::state::ceo_group;
use crate::types::{ClassifiedState, OTHER_GROUP};

/// One row of the composite decision table
pub struct CompositeRule {
    pub label: &'static str,
    pub matches: fn(&ClassifiedState) -> bool,
}

fn is_vip(state: &ClassifiedState) -> bool {
    state.value_tier == "vip"
}

fn vip_active(state: &ClassifiedState) -> bool {
    is_vip(state) && state.lifecycle_stage == "active"
}

fn vip_lapsed(state: &ClassifiedState) -> bool {
    is_vip(state) && matches!(state.lifecycle_stage.as_str(), "inactive" | "dead")
}

fn rising(state: &ClassifiedState) -> bool {
    state.momentum_stage == "rising"
}

fn newly_acquired(state: &ClassifiedState) -> bool {
    state.journey_stage == "first" || state.value_tier == "new"
}

fn one_time(state: &ClassifiedState) -> bool {
    state.loyalty_stage == "one_time"
}

fn dead(state: &ClassifiedState) -> bool {
    state.lifecycle_stage == "dead"
}

/// Decision table, highest priority first
pub const COMPOSITE_RULES: [CompositeRule; 6] = [
    CompositeRule {
        label: ceo_group::VIP_ACTIVE,
        matches: vip_active,
    },
    CompositeRule {
        label: ceo_group::VIP_INACTIVE,
        matches: vip_lapsed,
    },
    CompositeRule {
        label: ceo_group::RISING,
        matches: rising,
    },
    CompositeRule {
        label: ceo_group::NEW,
        matches: newly_acquired,
    },
    CompositeRule {
        label: ceo_group::ONE_TIME,
        matches: one_time,
    },
    CompositeRule {
        label: ceo_group::DEAD,
        matches: dead,
    },
];

/// Composite group of a classified state; ignores the state's current `ceo_group`
pub fn composite_group(state: &ClassifiedState) -> &'static str {
    COMPOSITE_RULES
        .iter()
        .find(|rule| (rule.matches)(state))
        .map(|rule| rule.label)
        .unwrap_or(OTHER_GROUP)
}
