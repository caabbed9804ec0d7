//! Customer activity history: the classification source.

pub mod operations;
