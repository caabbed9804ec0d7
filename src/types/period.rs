//! Report period granularities and their report keys

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar granularity of a report period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodType {
    pub const ALL: [PeriodType; 4] = [
        PeriodType::Day,
        PeriodType::Week,
        PeriodType::Month,
        PeriodType::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Day => "day",
            PeriodType::Week => "week",
            PeriodType::Month => "month",
            PeriodType::Year => "year",
        }
    }

    /// Report key the delta snapshots of this granularity are stored under
    pub fn report_key(&self) -> &'static str {
        match self {
            PeriodType::Day => "customer_daily",
            PeriodType::Week => "customer_weekly",
            PeriodType::Month => "customer_monthly",
            PeriodType::Year => "customer_yearly",
        }
    }

    pub fn from_report_key(report_key: &str) -> Result<Self, AppError> {
        PeriodType::ALL
            .iter()
            .find(|p| p.report_key() == report_key)
            .copied()
            .ok_or_else(|| AppError::Unknown {
                kind: "report key",
                value: report_key.to_string(),
            })
    }

    /// Guess the granularity from the key shape; ten-character keys read as days
    pub fn infer_from_key(period_key: &str) -> Result<Self, AppError> {
        match period_key.trim().len() {
            4 => Ok(PeriodType::Year),
            7 => Ok(PeriodType::Month),
            10 => Ok(PeriodType::Day),
            _ => Err(AppError::InvalidPeriodKey {
                key: period_key.to_string(),
                period_type: "any".to_string(),
            }),
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(PeriodType::Day),
            "week" | "weekly" => Ok(PeriodType::Week),
            "month" | "monthly" => Ok(PeriodType::Month),
            "year" | "yearly" => Ok(PeriodType::Year),
            other => PeriodType::from_report_key(other),
        }
    }
}
