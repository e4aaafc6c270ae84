//! PV Rules - Threshold Rule Engine Library
//!
//! User-defined threshold rules for solar panel readings:
//! - Closed `Metric`/`Condition` enums evaluated exhaustively
//! - Ordered evaluation of every rule against every reading
//! - Rule store with a single edit-in-progress slot
//! - YAML/JSON rule file import and export
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  save/delete   ┌──────────────┐  rules()   ┌─────────────┐
//! │  Rule form  │───────────────▶│  RuleStore   │───────────▶│  Evaluator  │
//! │  (drafts)   │                │ (edit slot)  │            │ (per batch) │
//! └─────────────┘                └──────────────┘            └─────────────┘
//! ```

mod error;
mod evaluator;
mod repository;
mod store;
pub mod types;

// Re-export public API
pub use error::{Result, RuleError};
pub use evaluator::RuleEvaluator;
pub use repository::{load_rules_file, save_rules_file};
pub use store::{EditTarget, RuleEdit, RuleStore};

// Re-export rule types for convenience
pub use types::{Condition, EqualityMode, Metric, Rule, RuleDraft, RuleId};
