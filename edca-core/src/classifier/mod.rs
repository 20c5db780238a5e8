//! Signal classification: data-driven rule tables over indicator snapshots.

pub mod condition;
pub mod rules;
pub mod signal;

pub use condition::Condition;
pub use rules::{Rule, RuleSet, RuleTable, RuleTableError, SignalStatus};
pub use signal::{SignalClassifier, SignalResult};
