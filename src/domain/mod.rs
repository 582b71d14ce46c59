//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod renko;
pub mod aligner;
pub mod signal;
pub mod metrics;
pub mod config;
pub mod config_validation;
pub mod pipeline;
pub mod error;
