//! Delta document: per-period in/out flows
//!
//! One document per (report key, period key, owner). Every dimension and
//! sub-dimension maps group label to an `{in, out}` pair; `out` is omitted
//! from the JSON form when zero. Maps are ordered so the serialised body is
//! deterministic for a given set of flows.

use super::state::{Dimension, ProfileKind};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::{AddAssign, Sub};

/// Numeric type carried by a flow: counts (`i64`) or money (`f64`)
pub trait FlowValue:
    Copy + Default + PartialEq + AddAssign + Sub<Output = Self> + Debug + Send + Sync
{
    fn is_zero(&self) -> bool;
}

impl FlowValue for i64 {
    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl FlowValue for f64 {
    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

fn is_zero<T: FlowValue>(value: &T) -> bool {
    value.is_zero()
}

/// Inflow/outflow pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow<T: FlowValue> {
    #[serde(rename = "in", default)]
    pub inflow: T,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub out: T,
}

impl<T: FlowValue> Flow<T> {
    pub fn inflow(amount: T) -> Self {
        Self {
            inflow: amount,
            out: T::default(),
        }
    }

    /// `in − out`
    pub fn net(&self) -> T {
        self.inflow - self.out
    }
}

/// Group label → flow
pub type GroupFlows<T> = BTreeMap<String, Flow<T>>;

/// Sub-dimension name → group flows
pub type SubDimensionFlows = BTreeMap<String, GroupFlows<i64>>;

/// Add to the inflow of a group; empty labels are ignored
pub fn credit<T: FlowValue>(flows: &mut GroupFlows<T>, group: &str, amount: T) {
    if group.is_empty() {
        return;
    }
    flows.entry(group.to_string()).or_default().inflow += amount;
}

/// Add to the outflow of a group; empty labels are ignored
pub fn debit<T: FlowValue>(flows: &mut GroupFlows<T>, group: &str, amount: T) {
    if group.is_empty() {
        return;
    }
    flows.entry(group.to_string()).or_default().out += amount;
}

/// Period-level scalar counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFlows {
    pub total_customers: Flow<i64>,
    pub new_customers_in_period: Flow<i64>,
    pub active_in_period: Flow<i64>,
    pub reactivation_value: Flow<f64>,
    #[serde(rename = "totalLTV")]
    pub total_ltv: Flow<f64>,
}

/// Customer journey layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layer1Flows {
    #[serde(rename = "journeyStage")]
    pub journey_stage: GroupFlows<i64>,
    #[serde(rename = "journeyStageLTV")]
    pub journey_stage_ltv: GroupFlows<f64>,
}

/// Customer segmentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layer2Flows {
    #[serde(rename = "valueTier")]
    pub value_tier: GroupFlows<i64>,
    #[serde(rename = "lifecycleStage")]
    pub lifecycle_stage: GroupFlows<i64>,
    pub channel: GroupFlows<i64>,
    #[serde(rename = "loyaltyStage")]
    pub loyalty_stage: GroupFlows<i64>,
    #[serde(rename = "momentumStage")]
    pub momentum_stage: GroupFlows<i64>,
    #[serde(rename = "ceoGroup")]
    pub ceo_group: GroupFlows<i64>,
    #[serde(rename = "valueTierLTV")]
    pub value_tier_ltv: GroupFlows<f64>,
    #[serde(rename = "lifecycleStageLTV")]
    pub lifecycle_stage_ltv: GroupFlows<f64>,
    #[serde(rename = "channelLTV")]
    pub channel_ltv: GroupFlows<f64>,
    #[serde(rename = "loyaltyStageLTV")]
    pub loyalty_stage_ltv: GroupFlows<f64>,
    #[serde(rename = "momentumStageLTV")]
    pub momentum_stage_ltv: GroupFlows<f64>,
    #[serde(rename = "ceoGroupLTV")]
    pub ceo_group_ltv: GroupFlows<f64>,
}

/// Sub-profile layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layer3Flows {
    pub first: SubDimensionFlows,
    pub repeat: SubDimensionFlows,
    pub vip: SubDimensionFlows,
    pub inactive: SubDimensionFlows,
    pub engaged: SubDimensionFlows,
}

/// The flow body of a delta document (everything except identity and stamps)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodFlows {
    pub raw: RawFlows,
    pub layer1: Layer1Flows,
    pub layer2: Layer2Flows,
    pub layer3: Layer3Flows,
}

impl PeriodFlows {
    pub fn counts(&self, dimension: Dimension) -> &GroupFlows<i64> {
        match dimension {
            Dimension::JourneyStage => &self.layer1.journey_stage,
            Dimension::ValueTier => &self.layer2.value_tier,
            Dimension::LifecycleStage => &self.layer2.lifecycle_stage,
            Dimension::Channel => &self.layer2.channel,
            Dimension::LoyaltyStage => &self.layer2.loyalty_stage,
            Dimension::MomentumStage => &self.layer2.momentum_stage,
            Dimension::CeoGroup => &self.layer2.ceo_group,
        }
    }

    pub fn counts_mut(&mut self, dimension: Dimension) -> &mut GroupFlows<i64> {
        match dimension {
            Dimension::JourneyStage => &mut self.layer1.journey_stage,
            Dimension::ValueTier => &mut self.layer2.value_tier,
            Dimension::LifecycleStage => &mut self.layer2.lifecycle_stage,
            Dimension::Channel => &mut self.layer2.channel,
            Dimension::LoyaltyStage => &mut self.layer2.loyalty_stage,
            Dimension::MomentumStage => &mut self.layer2.momentum_stage,
            Dimension::CeoGroup => &mut self.layer2.ceo_group,
        }
    }

    pub fn ltv(&self, dimension: Dimension) -> &GroupFlows<f64> {
        match dimension {
            Dimension::JourneyStage => &self.layer1.journey_stage_ltv,
            Dimension::ValueTier => &self.layer2.value_tier_ltv,
            Dimension::LifecycleStage => &self.layer2.lifecycle_stage_ltv,
            Dimension::Channel => &self.layer2.channel_ltv,
            Dimension::LoyaltyStage => &self.layer2.loyalty_stage_ltv,
            Dimension::MomentumStage => &self.layer2.momentum_stage_ltv,
            Dimension::CeoGroup => &self.layer2.ceo_group_ltv,
        }
    }

    pub fn ltv_mut(&mut self, dimension: Dimension) -> &mut GroupFlows<f64> {
        match dimension {
            Dimension::JourneyStage => &mut self.layer1.journey_stage_ltv,
            Dimension::ValueTier => &mut self.layer2.value_tier_ltv,
            Dimension::LifecycleStage => &mut self.layer2.lifecycle_stage_ltv,
            Dimension::Channel => &mut self.layer2.channel_ltv,
            Dimension::LoyaltyStage => &mut self.layer2.loyalty_stage_ltv,
            Dimension::MomentumStage => &mut self.layer2.momentum_stage_ltv,
            Dimension::CeoGroup => &mut self.layer2.ceo_group_ltv,
        }
    }

    pub fn profile(&self, kind: ProfileKind) -> &SubDimensionFlows {
        match kind {
            ProfileKind::First => &self.layer3.first,
            ProfileKind::Repeat => &self.layer3.repeat,
            ProfileKind::Vip => &self.layer3.vip,
            ProfileKind::Inactive => &self.layer3.inactive,
            ProfileKind::Engaged => &self.layer3.engaged,
        }
    }

    pub fn profile_mut(&mut self, kind: ProfileKind) -> &mut SubDimensionFlows {
        match kind {
            ProfileKind::First => &mut self.layer3.first,
            ProfileKind::Repeat => &mut self.layer3.repeat,
            ProfileKind::Vip => &mut self.layer3.vip,
            ProfileKind::Inactive => &mut self.layer3.inactive,
            ProfileKind::Engaged => &mut self.layer3.engaged,
        }
    }

    /// Σ in − Σ out over every group of a dimension
    pub fn net_customers(&self, dimension: Dimension) -> i64 {
        self.counts(dimension).values().map(Flow::net).sum()
    }

    /// SHA-256 of the serialised body, hex encoded
    pub fn fingerprint(&self) -> AppResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Persisted per-period delta snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaDocument {
    pub report_key: String,
    pub period_key: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub flows: PeriodFlows,
    /// Unix seconds
    pub computed_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_hash: String,
}

impl DeltaDocument {
    /// New, not yet persisted document; stamps are filled by the snapshot store
    pub fn new(report_key: &str, period_key: &str, owner_id: &str, flows: PeriodFlows) -> Self {
        Self {
            report_key: report_key.to_string(),
            period_key: period_key.to_string(),
            owner_id: owner_id.to_string(),
            flows,
            computed_at: 0,
            created_at: 0,
            updated_at: 0,
            content_hash: String::new(),
        }
    }
}
