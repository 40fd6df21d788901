//! Core domain models for Policy QA
//!
//! This crate contains the shared data structures used across
//! the rule engine: Rule, FactRecord, Decision and MatchOutcome.

pub mod error;
pub mod models;

pub use error::CoreError;
pub use models::*;
