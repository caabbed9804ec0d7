//! Dirty-period queue.

pub mod operations;
