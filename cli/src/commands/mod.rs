//! Command implementations

pub mod apply;
pub mod plan;
