//! Storage layer for Policy QA
//!
//! Loads the extracted rule file, validates each entry, and publishes
//! the resulting rule set as an atomically swappable snapshot.

pub mod error;
pub mod file;
pub mod loader;
pub mod memory;
pub mod store;
pub mod traits;
pub mod validator;

pub use error::StorageError;
pub use file::JsonFileSource;
pub use loader::{load_rules, validate_entries, LoadReport};
pub use memory::InMemoryRuleSource;
pub use store::{RuleSet, RuleStore};
pub use traits::RuleSource;
pub use validator::validate_rule;
