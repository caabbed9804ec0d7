//! Classified customer state
//!
//! A `ClassifiedState` is the point-in-time view of one customer: six
//! independent categorical dimensions, the derived composite group, the
//! monetary lifetime value and up to five layer-3 sub-profiles.

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label for a dimension that is unset on the source record
pub const UNSPECIFIED: &str = "_unspecified";

/// Composite group for customers matching no rule
pub const OTHER_GROUP: &str = "_other";

/// Composite group labels
pub mod ceo_group {
    pub const VIP_ACTIVE: &str = "vip_active";
    pub const VIP_INACTIVE: &str = "vip_inactive";
    pub const RISING: &str = "rising";
    pub const NEW: &str = "new";
    pub const ONE_TIME: &str = "one_time";
    pub const DEAD: &str = "dead";
}

/// Map an empty label to the unspecified sentinel
pub fn label_or_unspecified(label: &str) -> &str {
    if label.trim().is_empty() {
        UNSPECIFIED
    } else {
        label
    }
}

/// Top-level classification dimensions
///
/// Journey stage is persisted under `layer1`, every other dimension under `layer2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    JourneyStage,
    ValueTier,
    LifecycleStage,
    Channel,
    LoyaltyStage,
    MomentumStage,
    CeoGroup,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::JourneyStage,
        Dimension::ValueTier,
        Dimension::LifecycleStage,
        Dimension::Channel,
        Dimension::LoyaltyStage,
        Dimension::MomentumStage,
        Dimension::CeoGroup,
    ];

    /// Field name in metrics records and delta documents
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::JourneyStage => "journeyStage",
            Dimension::ValueTier => "valueTier",
            Dimension::LifecycleStage => "lifecycleStage",
            Dimension::Channel => "channel",
            Dimension::LoyaltyStage => "loyaltyStage",
            Dimension::MomentumStage => "momentumStage",
            Dimension::CeoGroup => "ceoGroup",
        }
    }

    /// Short name accepted by transition queries
    pub fn short_name(&self) -> &'static str {
        match self {
            Dimension::JourneyStage => "journey",
            Dimension::ValueTier => "value",
            Dimension::LifecycleStage => "lifecycle",
            Dimension::Channel => "channel",
            Dimension::LoyaltyStage => "loyalty",
            Dimension::MomentumStage => "momentum",
            Dimension::CeoGroup => "ceoGroup",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for Dimension {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Dimension::ALL
            .iter()
            .find(|d| {
                d.short_name().eq_ignore_ascii_case(trimmed) || d.key().eq_ignore_ascii_case(trimmed)
            })
            .copied()
            .ok_or_else(|| AppError::Unknown {
                kind: "dimension",
                value: s.to_string(),
            })
    }
}

/// Layer-3 sub-profile kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileKind {
    First,
    Repeat,
    Vip,
    Inactive,
    Engaged,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 5] = [
        ProfileKind::First,
        ProfileKind::Repeat,
        ProfileKind::Vip,
        ProfileKind::Inactive,
        ProfileKind::Engaged,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ProfileKind::First => "first",
            ProfileKind::Repeat => "repeat",
            ProfileKind::Vip => "vip",
            ProfileKind::Inactive => "inactive",
            ProfileKind::Engaged => "engaged",
        }
    }
}

/// Sub-dimension labels of a layer-3 profile, in a fixed order
pub trait SubProfile {
    fn labels(&self) -> Vec<(&'static str, &str)>;
}

/// First-purchase profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirstProfile {
    pub purchase_quality: String,
    pub experience_quality: String,
    pub engagement_after_purchase: String,
    pub reorder_timing: String,
    pub repeat_probability: String,
}

impl SubProfile for FirstProfile {
    fn labels(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("purchaseQuality", label_or_unspecified(&self.purchase_quality)),
            ("experienceQuality", label_or_unspecified(&self.experience_quality)),
            (
                "engagementAfterPurchase",
                label_or_unspecified(&self.engagement_after_purchase),
            ),
            ("reorderTiming", label_or_unspecified(&self.reorder_timing)),
            ("repeatProbability", label_or_unspecified(&self.repeat_probability)),
        ]
    }
}

/// Repeat-purchase profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepeatProfile {
    pub repeat_depth: String,
    pub repeat_frequency: String,
    pub spend_momentum: String,
    pub product_expansion: String,
    pub emotional_engagement: String,
    pub upgrade_potential: String,
}

impl SubProfile for RepeatProfile {
    fn labels(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("repeatDepth", label_or_unspecified(&self.repeat_depth)),
            ("repeatFrequency", label_or_unspecified(&self.repeat_frequency)),
            ("spendMomentum", label_or_unspecified(&self.spend_momentum)),
            ("productExpansion", label_or_unspecified(&self.product_expansion)),
            (
                "emotionalEngagement",
                label_or_unspecified(&self.emotional_engagement),
            ),
            ("upgradePotential", label_or_unspecified(&self.upgrade_potential)),
        ]
    }
}

/// VIP profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VipProfile {
    pub vip_depth: String,
    pub spend_trend: String,
    pub product_diversity: String,
    pub engagement_level: String,
    pub risk_score: String,
}

impl SubProfile for VipProfile {
    fn labels(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("vipDepth", label_or_unspecified(&self.vip_depth)),
            ("spendTrend", label_or_unspecified(&self.spend_trend)),
            ("productDiversity", label_or_unspecified(&self.product_diversity)),
            ("engagementLevel", label_or_unspecified(&self.engagement_level)),
            ("riskScore", label_or_unspecified(&self.risk_score)),
        ]
    }
}

/// Inactive (win-back) profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InactiveProfile {
    pub engagement_drop: String,
    pub reactivation_potential: String,
}

impl SubProfile for InactiveProfile {
    fn labels(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("engagementDrop", label_or_unspecified(&self.engagement_drop)),
            (
                "reactivationPotential",
                label_or_unspecified(&self.reactivation_potential),
            ),
        ]
    }
}

/// Engaged-but-never-purchased profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagedProfile {
    pub conversation_temperature: String,
    pub engagement_depth: String,
    pub source_type: String,
}

impl SubProfile for EngagedProfile {
    fn labels(&self) -> Vec<(&'static str, &str)> {
        vec![
            (
                "conversationTemperature",
                label_or_unspecified(&self.conversation_temperature),
            ),
            ("engagementDepth", label_or_unspecified(&self.engagement_depth)),
            ("sourceType", label_or_unspecified(&self.source_type)),
        ]
    }
}

/// The five optional sub-profiles of a customer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Layer3Profiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<FirstProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip: Option<VipProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<InactiveProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engaged: Option<EngagedProfile>,
}

impl Layer3Profiles {
    /// Labels of one sub-profile, `None` when the customer does not carry it
    pub fn labels(&self, kind: ProfileKind) -> Option<Vec<(&'static str, &str)>> {
        match kind {
            ProfileKind::First => self.first.as_ref().map(|p| p.labels()),
            ProfileKind::Repeat => self.repeat.as_ref().map(|p| p.labels()),
            ProfileKind::Vip => self.vip.as_ref().map(|p| p.labels()),
            ProfileKind::Inactive => self.inactive.as_ref().map(|p| p.labels()),
            ProfileKind::Engaged => self.engaged.as_ref().map(|p| p.labels()),
        }
    }

    pub fn is_empty(&self) -> bool {
        ProfileKind::ALL.iter().all(|k| self.labels(*k).is_none())
    }
}

/// One customer's classification at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedState {
    pub value_tier: String,
    pub lifecycle_stage: String,
    pub journey_stage: String,
    pub channel: String,
    pub loyalty_stage: String,
    pub momentum_stage: String,
    pub ceo_group: String,
    /// Lifetime value used for the LTV maps
    pub total_spent: f64,
    pub order_count: i64,
    /// Unix milliseconds, 0 when the customer never ordered
    pub last_order_at: i64,
    pub layer3: Layer3Profiles,
}

impl Default for ClassifiedState {
    fn default() -> Self {
        Self {
            value_tier: UNSPECIFIED.to_string(),
            lifecycle_stage: UNSPECIFIED.to_string(),
            journey_stage: UNSPECIFIED.to_string(),
            channel: UNSPECIFIED.to_string(),
            loyalty_stage: UNSPECIFIED.to_string(),
            momentum_stage: UNSPECIFIED.to_string(),
            ceo_group: OTHER_GROUP.to_string(),
            total_spent: 0.0,
            order_count: 0,
            last_order_at: 0,
            layer3: Layer3Profiles::default(),
        }
    }
}

impl ClassifiedState {
    /// Group label of a dimension
    pub fn label(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::JourneyStage => &self.journey_stage,
            Dimension::ValueTier => &self.value_tier,
            Dimension::LifecycleStage => &self.lifecycle_stage,
            Dimension::Channel => &self.channel,
            Dimension::LoyaltyStage => &self.loyalty_stage,
            Dimension::MomentumStage => &self.momentum_stage,
            Dimension::CeoGroup => &self.ceo_group,
        }
    }

    /// VIP whose lifecycle lapsed to inactive or dead
    pub fn is_vip_inactive(&self) -> bool {
        self.ceo_group == ceo_group::VIP_INACTIVE
    }

    /// True when every dimension and every sub-profile label matches
    pub fn same_classification(&self, other: &ClassifiedState) -> bool {
        Dimension::ALL
            .iter()
            .all(|d| self.label(*d) == other.label(*d))
            && ProfileKind::ALL
                .iter()
                .all(|k| self.layer3.labels(*k) == other.layer3.labels(*k))
    }

    /// Last order falls inside the inclusive window
    pub fn ordered_within(&self, start_ms: i64, end_ms: i64) -> bool {
        self.order_count >= 1 && self.last_order_at >= start_ms && self.last_order_at <= end_ms
    }
}
