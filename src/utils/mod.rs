//! Shared helpers: safe arithmetic and report time.

pub mod math;
pub mod time;
