//! Customer Flow Report - Type System
//!
//! - `state`: ClassifiedState, dimensions and layer-3 sub-profiles
//! - `activity`: customer activity records (the classification source)
//! - `period`: report period granularities and report keys
//! - `delta`: per-period in/out flow documents
//! - `balance`: point-in-time balances
//! - `transition`: transition matrices and ordinal group changes
//! - `trend`: snapshot series and period-over-period comparison
//! - `visualisation`: Plotly chart shapes

pub mod activity;
pub mod balance;
pub mod delta;
pub mod period;
pub mod state;
pub mod transition;
pub mod trend;
pub mod visualisation;

pub use activity::ActivityRecord;
pub use balance::{Balance, BalanceSource, RawBalance};
pub use delta::{
    credit, debit, DeltaDocument, Flow, FlowValue, GroupFlows, PeriodFlows, RawFlows,
    SubDimensionFlows,
};
pub use period::PeriodType;
pub use state::{
    ClassifiedState, Dimension, EngagedProfile, FirstProfile, InactiveProfile, Layer3Profiles,
    ProfileKind, RepeatProfile, SubProfile, VipProfile, OTHER_GROUP, UNSPECIFIED,
};
pub use transition::{GroupChange, GroupChanges, SankeyData, SankeyLink, SankeyNode, TransitionMatrix};
pub use trend::{MetricChange, TrendComparison, TrendReport};
