//! UAX#9 rewrite rules
//!
//! - `types`: rules, passes and actions
//! - `table`: the rule dictionary and the shared, lazily built rule set

pub mod table;
pub mod types;

pub use table::{rules, Candidates, RuleSet, RULE_DEFINITIONS};
pub use types::{ContextRule, Pass, Rule, RuleAction, RuleEnv};
