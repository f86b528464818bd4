//! HTTP surface over `scout-core`.

pub mod api;
pub mod metrics;
pub mod state;
