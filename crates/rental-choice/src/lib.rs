//! Short-term versus long-term rental revenue analysis.
//!
//! The batch runs in five stages: booking-ledger summarization, long-term snapshot
//! reconciliation, segmented rent imputation, revenue comparison and host
//! segmentation with per-segment preference models. [`analysis::run`] drives them
//! all from one [`config::AnalysisConfig`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod telemetry;
