//! Rule Evaluation
//!
//! Every rule is checked against every reading in store order. A reading may
//! match any number of rules and each match stands on its own.

use crate::types::{EqualityMode, Rule};
use pv_model::Reading;
use tracing::trace;

/// Evaluates an ordered rule list against readings
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator {
    equality: EqualityMode,
}

impl RuleEvaluator {
    pub fn new(equality: EqualityMode) -> Self {
        Self { equality }
    }

    pub fn equality(&self) -> EqualityMode {
        self.equality
    }

    /// Rules matching `reading`, in the order given
    pub fn matching<'r>(&self, rules: &'r [Rule], reading: &Reading) -> Vec<&'r Rule> {
        let matched: Vec<&Rule> = rules
            .iter()
            .filter(|rule| rule.matches(reading, self.equality))
            .collect();

        if !matched.is_empty() {
            trace!(
                reading_id = reading.id,
                panel_id = %reading.panel_id,
                "{} rule(s) matched",
                matched.len()
            );
        }
        matched
    }
}
