//! Delta snapshot store.

pub mod operations;
