//! Run orchestration for paperscout.
//!
//! This crate ties together search, figure extraction, translation,
//! notification, and persistence into one query-driven run
//! ([`pipeline::Pipeline::run`]), plus the candidate filter it applies.

pub mod filter;
pub mod pipeline;
