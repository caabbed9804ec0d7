//! Layer-3 sub-profile derivation
//!
//! Sub-profiles refine a customer inside their journey: first-time buyers,
//! repeat buyers, VIPs, lapsed buyers and engaged prospects. Each is built
//! from purchase and conversation signals as of a reference time.

use super::metrics::MetricsView;
use crate::types::state::{
    EngagedProfile, FirstProfile, InactiveProfile, Layer3Profiles, RepeatProfile, VipProfile,
};
use crate::types::ClassifiedState;
use crate::utils::time::{days_between, to_millis, MS_PER_DAY};
use tracing::debug;

const FIRST_HIGH_AOV: f64 = 500_000.0;
const FIRST_ENTRY_AOV: f64 = 150_000.0;
const FIRST_REORDER_TOO_EARLY_DAYS: i64 = 7;
const FIRST_REORDER_EXPECTED_MAX_DAYS: i64 = 60;
const REPEAT_EARLY_MAX_DAYS: i64 = 7;
const REPEAT_ON_TRACK_MAX_DAYS: i64 = 45;
const REPEAT_DELAYED_MAX_DAYS: i64 = 90;
const REPEAT_MULTI_CATEGORY_SKUS: usize = 3;
const REPEAT_HIGH_SPEND: f64 = 2_000_000.0;
const VIP_MIN_ORDERS: i64 = 8;
const VIP_SILVER_MAX_ORDERS: i64 = 12;
const VIP_GOLD_MAX_ORDERS: i64 = 25;
const VIP_PLATINUM_MAX_ORDERS: i64 = 40;
const VIP_SINGLE_LINE_MAX_SKUS: usize = 2;
const VIP_MULTI_LINE_MAX_SKUS: usize = 7;
const SPEND_SHIFT_THRESHOLD: f64 = 0.15;

/// Purchase and conversation signals shared by the derivations
#[derive(Debug, Clone, Default)]
struct Signals {
    order_count: i64,
    total_spent: f64,
    avg_order_value: f64,
    revenue_last_30d: f64,
    orders_last_30d: i64,
    cancelled_orders: i64,
    last_order_ms: i64,
    second_last_order_ms: i64,
    last_conversation_ms: i64,
    owned_skus: usize,
    total_messages: i64,
    from_ads: bool,
}

impl Signals {
    fn read(view: &MetricsView<'_>) -> Self {
        let sku_count = view.i64("ownedSkuCount");
        Self {
            order_count: view.i64("orderCount"),
            total_spent: view.f64("totalSpent"),
            avg_order_value: view.f64("avgOrderValue"),
            revenue_last_30d: view.f64("revenueLast30d"),
            orders_last_30d: view.i64("ordersLast30d"),
            cancelled_orders: view.i64("cancelledOrderCount"),
            last_order_ms: to_millis(view.i64("lastOrderAt")),
            second_last_order_ms: to_millis(view.i64("secondLastOrderAt")),
            last_conversation_ms: to_millis(view.i64("lastConversationAt")),
            owned_skus: if sku_count > 0 {
                sku_count as usize
            } else {
                view.object_len("ownedSkuQuantities")
            },
            total_messages: view.i64("totalMessages"),
            from_ads: view.bool("conversationFromAds"),
        }
    }

    /// Conversation after the last order
    fn talked_after_order(&self) -> bool {
        self.last_conversation_ms > self.last_order_ms && self.last_order_ms > 0
    }

    /// Relative change of the recent average order value against the lifetime one
    fn spend_shift(&self) -> Option<f64> {
        if self.orders_last_30d <= 0 || self.avg_order_value <= 0.0 {
            return None;
        }
        let recent_aov = self.revenue_last_30d / self.orders_last_30d as f64;
        Some((recent_aov - self.avg_order_value) / self.avg_order_value)
    }
}

/// Sub-profiles for a classified customer
///
/// Profiles stored on the metrics document win; otherwise they are derived
/// as of `as_of_ms`.
pub fn layer3_profiles(view: &MetricsView<'_>, state: &ClassifiedState, as_of_ms: i64) -> Layer3Profiles {
    if let Some(stored) = view.layer3() {
        match serde_json::from_value::<Layer3Profiles>(serde_json::Value::Object(stored.clone())) {
            Ok(profiles) if !profiles.is_empty() => return profiles,
            Ok(_) => {}
            Err(e) => debug!("Ignoring unreadable layer3 block: {}", e),
        }
    }
    derive_profiles(view, state, as_of_ms)
}

/// Derive every applicable sub-profile from raw signals
pub fn derive_profiles(view: &MetricsView<'_>, state: &ClassifiedState, as_of_ms: i64) -> Layer3Profiles {
    let signals = Signals::read(view);
    let days_since_last = days_between(signals.last_order_ms, as_of_ms);
    let orders = signals.order_count;

    let mut profiles = Layer3Profiles::default();
    if state.journey_stage == "first" && orders == 1 {
        profiles.first = Some(first_profile(&signals, days_since_last));
    }
    if state.journey_stage == "repeat" && orders >= 2 {
        profiles.repeat = Some(repeat_profile(&signals, days_since_last));
    }
    if (state.journey_stage == "vip" || state.value_tier == "vip") && orders >= VIP_MIN_ORDERS {
        profiles.vip = Some(vip_profile(&signals, &state.lifecycle_stage, days_since_last));
    }
    if matches!(state.lifecycle_stage.as_str(), "cooling" | "inactive" | "dead") && orders >= 1 {
        profiles.inactive = Some(inactive_profile(&signals, state));
    }
    if state.journey_stage == "engaged" && orders == 0 {
        profiles.engaged = Some(engaged_profile(&signals, as_of_ms));
    }
    profiles
}

fn first_profile(signals: &Signals, days_since_last: i64) -> FirstProfile {
    let purchase_quality = if signals.avg_order_value >= FIRST_HIGH_AOV {
        "high_aov"
    } else if signals.avg_order_value < FIRST_ENTRY_AOV {
        "entry"
    } else {
        "medium"
    };
    let experience_quality = if signals.cancelled_orders > 0 { "risk" } else { "smooth" };
    let engagement = if signals.last_conversation_ms > 0 && signals.talked_after_order() {
        "post_purchase_engaged"
    } else {
        "silent"
    };
    let reorder_timing = if days_since_last < 0 {
        "within_expected"
    } else if days_since_last < FIRST_REORDER_TOO_EARLY_DAYS {
        "too_early"
    } else if days_since_last > FIRST_REORDER_EXPECTED_MAX_DAYS {
        "overdue"
    } else {
        "within_expected"
    };

    let mut score = 0;
    score += match purchase_quality {
        "high_aov" => 2,
        "medium" => 1,
        _ => 0,
    };
    score += if experience_quality == "smooth" { 2 } else { -1 };
    if engagement == "post_purchase_engaged" {
        score += 2;
    }
    score += if reorder_timing == "overdue" { -1 } else { 1 };

    FirstProfile {
        purchase_quality: purchase_quality.to_string(),
        experience_quality: experience_quality.to_string(),
        engagement_after_purchase: engagement.to_string(),
        reorder_timing: reorder_timing.to_string(),
        repeat_probability: grade(score, 5, 1).to_string(),
    }
}

fn repeat_profile(signals: &Signals, days_since_last: i64) -> RepeatProfile {
    let depth = match signals.order_count {
        3..=4 => "R2",
        5..=7 => "R3",
        n if n >= 8 => "R4",
        _ => "R1",
    };
    let frequency = repeat_frequency(signals, days_since_last);
    let momentum = match signals.spend_shift() {
        Some(shift) if shift >= SPEND_SHIFT_THRESHOLD => "upscaling",
        Some(shift) if shift <= -SPEND_SHIFT_THRESHOLD => "downscaling",
        _ => "stable",
    };
    let expansion = if signals.owned_skus >= REPEAT_MULTI_CATEGORY_SKUS {
        "multi_category"
    } else {
        "single_category"
    };
    let engagement = if signals.last_conversation_ms <= 0 {
        "silent_repeat"
    } else if signals.talked_after_order() {
        "engaged_repeat"
    } else {
        "transactional_repeat"
    };

    let mut score = match depth {
        "R4" | "R3" => 2,
        "R2" => 1,
        _ => 0,
    };
    score += match frequency {
        "on_track" => 2,
        "early" => 1,
        "overdue" => -1,
        _ => 0,
    };
    score += match momentum {
        "upscaling" => 2,
        "stable" => 1,
        _ => -1,
    };
    score += match engagement {
        "engaged_repeat" => 2,
        "transactional_repeat" => 1,
        _ => 0,
    };
    if signals.total_spent >= REPEAT_HIGH_SPEND {
        score += 1;
    }

    RepeatProfile {
        repeat_depth: depth.to_string(),
        repeat_frequency: frequency.to_string(),
        spend_momentum: momentum.to_string(),
        product_expansion: expansion.to_string(),
        emotional_engagement: engagement.to_string(),
        upgrade_potential: grade(score, 6, 2).to_string(),
    }
}

/// Days since the last order against the customer's own reorder gap, or fixed bands
fn repeat_frequency(signals: &Signals, days_since_last: i64) -> &'static str {
    if days_since_last < 0 {
        return "on_track";
    }
    let gap_ms = signals.last_order_ms - signals.second_last_order_ms;
    if signals.second_last_order_ms > 0 && signals.last_order_ms > 0 && gap_ms > 0 {
        let avg_days = gap_ms as f64 / MS_PER_DAY as f64;
        return if days_since_last < (avg_days * 0.5) as i64 {
            "early"
        } else if days_since_last <= (avg_days * 1.5) as i64 {
            "on_track"
        } else if days_since_last <= (avg_days * 2.0) as i64 {
            "delayed"
        } else {
            "overdue"
        };
    }
    if days_since_last < REPEAT_EARLY_MAX_DAYS {
        "early"
    } else if days_since_last <= REPEAT_ON_TRACK_MAX_DAYS {
        "on_track"
    } else if days_since_last <= REPEAT_DELAYED_MAX_DAYS {
        "delayed"
    } else {
        "overdue"
    }
}

fn vip_profile(signals: &Signals, lifecycle: &str, days_since_last: i64) -> VipProfile {
    let depth = match signals.order_count {
        n if n <= VIP_SILVER_MAX_ORDERS => "silver_vip",
        n if n <= VIP_GOLD_MAX_ORDERS => "gold_vip",
        n if n <= VIP_PLATINUM_MAX_ORDERS => "platinum_vip",
        _ => "core_patron",
    };
    let trend = match signals.spend_shift() {
        Some(shift) if shift >= SPEND_SHIFT_THRESHOLD => "upscaling_vip",
        Some(shift) if shift <= -SPEND_SHIFT_THRESHOLD => "downscaling_vip",
        _ => "stable_vip",
    };
    let diversity = if signals.owned_skus <= VIP_SINGLE_LINE_MAX_SKUS {
        "single_line_vip"
    } else if signals.owned_skus <= VIP_MULTI_LINE_MAX_SKUS {
        "multi_line_vip"
    } else {
        "full_portfolio_vip"
    };
    let engagement = if signals.last_conversation_ms <= 0 {
        "silent_vip"
    } else if signals.talked_after_order() {
        "engaged_vip"
    } else {
        "transactional_vip"
    };

    let mut score = match lifecycle {
        "cooling" => 1,
        "inactive" => -1,
        "dead" => -2,
        _ => 2,
    };
    score += match trend {
        "upscaling_vip" => 2,
        "stable_vip" => 1,
        _ => -2,
    };
    score += match engagement {
        "engaged_vip" => 2,
        "silent_vip" => -1,
        _ => 0,
    };
    if days_since_last > 90 {
        score -= 2;
    } else if days_since_last > 60 {
        score -= 1;
    }
    let risk = match score {
        s if s <= -4 => "critical",
        s if s <= -1 => "high",
        s if s <= 2 => "medium",
        _ => "low",
    };

    VipProfile {
        vip_depth: depth.to_string(),
        spend_trend: trend.to_string(),
        product_diversity: diversity.to_string(),
        engagement_level: engagement.to_string(),
        risk_score: risk.to_string(),
    }
}

fn inactive_profile(signals: &Signals, state: &ClassifiedState) -> InactiveProfile {
    let drop = if signals.last_conversation_ms <= 0 {
        "no_engagement"
    } else if signals.talked_after_order() {
        "had_post_engagement"
    } else {
        "dropped_engagement"
    };

    let mut score = match state.value_tier.as_str() {
        "vip" => 3,
        "high" => 2,
        "medium" => 1,
        _ => 0,
    };
    score += match state.lifecycle_stage.as_str() {
        "cooling" => 3,
        "inactive" => 2,
        _ => 0,
    };
    if signals.order_count >= 8 {
        score += 2;
    } else if signals.order_count >= 2 {
        score += 1;
    }
    score += match drop {
        "had_post_engagement" => 2,
        "dropped_engagement" => 1,
        _ => 0,
    };

    InactiveProfile {
        engagement_drop: drop.to_string(),
        reactivation_potential: grade(score, 7, 3).to_string(),
    }
}

fn engaged_profile(signals: &Signals, as_of_ms: i64) -> EngagedProfile {
    let temperature = match days_between(signals.last_conversation_ms, as_of_ms) {
        d if d < 0 => "cold",
        d if d <= 1 => "hot",
        d if d <= 3 => "warm",
        d if d <= 7 => "cooling",
        _ => "cold",
    };
    let depth = match signals.total_messages {
        n if n <= 3 => "light",
        n if n <= 10 => "medium",
        _ => "deep",
    };
    EngagedProfile {
        conversation_temperature: temperature.to_string(),
        engagement_depth: depth.to_string(),
        source_type: if signals.from_ads { "ads" } else { "organic" }.to_string(),
    }
}

/// high at or above `high_from`, low at or below `low_to`, medium between
fn grade(score: i32, high_from: i32, low_to: i32) -> &'static str {
    if score >= high_from {
        "high"
    } else if score <= low_to {
        "low"
    } else {
        "medium"
    }
}
