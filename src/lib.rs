//! Customer Lifecycle Flow Accounting
//!
//! Classifies customer activity history into lifecycle groups, records per-period
//! in/out flows as delta snapshots, and reconstructs balances, trends and
//! transition matrices from them.

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod period;
pub mod processor;
pub mod types;
pub mod utils;
