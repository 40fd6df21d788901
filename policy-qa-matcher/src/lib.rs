//! Rule matcher for extracted policy rules
//!
//! Evaluates a fact record against an ordered rule set and returns the
//! first fully matching rule's decision. Pure and synchronous: safe to call
//! concurrently over a shared rule snapshot.

pub mod error;
pub mod matcher;

pub use error::{CoercionError, MatchError};
pub use matcher::{condition_holds, evaluate, rule_matches};
