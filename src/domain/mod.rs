//! Core domain types and logic.

pub mod bar;
pub mod session;
pub mod opening_range;
pub mod risk;
pub mod signal;
pub mod state_machine;
pub mod replay;
pub mod metrics;
pub mod watchlist;
pub mod config_validation;
pub mod error;
