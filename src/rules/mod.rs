pub mod engine;
pub mod model;
pub mod store;

pub use engine::{evaluate_rule, evaluate_rules, ActionKind, AutomationRun, TriggeredAction};
pub use model::{AutomationRule, RuleDraft, RuleKind};
pub use store::RuleStore;
