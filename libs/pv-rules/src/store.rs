//! Rule Store
//!
//! Ordered rule list plus a single edit slot:
//!
//! ```text
//!            start_create / start_edit(existing)
//!   ┌──────┐ ─────────────────────────────────▶ ┌─────────────────┐
//!   │ Idle │                                     │ Editing(target) │ ◀─┐
//!   └──────┘ ◀───────────────────────────────── └─────────────────┘   │
//!              save(valid) / cancel                   │ save(invalid) │
//!                                                     └───────────────┘
//! ```
//!
//! Rules keep their position and id across updates. Deleting is idempotent.

use crate::error::{Result, RuleError};
use crate::types::{Rule, RuleDraft, RuleId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What the draft in edit will become on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditTarget {
    /// A rule not yet in the store
    New,
    /// Replace the rule with this id
    Existing(RuleId),
}

/// The draft in flight and what it will become
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEdit {
    pub target: EditTarget,
    pub draft: RuleDraft,
}

/// Ordered collection of user rules with one edit in flight at most
#[derive(Debug, Clone)]
pub struct RuleStore {
    rules: Vec<Rule>,
    next_id: RuleId,
    edit: Option<RuleEdit>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            next_id: 1,
            edit: None,
        }
    }

    /// Rebuild from persisted rules, keeping their order.
    ///
    /// Duplicate or zero ids are reassigned so every rule stays addressable.
    /// Fails when the persisted ids leave no room for a new one.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self> {
        let mut store = Self::new();
        let max_id = rules.iter().map(|r| r.id).max().unwrap_or(0);
        store.next_id = max_id
            .checked_add(1)
            .ok_or(RuleError::IdsExhausted(max_id))?;

        for mut rule in rules {
            if rule.id == 0 || store.contains(rule.id) {
                let fresh = store.allocate_id()?;
                warn!("Rule id {} reassigned to {}", rule.id, fresh);
                rule.id = fresh;
            }
            store.rules.push(rule);
        }
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Edit in flight, `None` when idle
    pub fn edit(&self) -> Option<&RuleEdit> {
        self.edit.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn edit_target(&self) -> Option<EditTarget> {
        self.edit.as_ref().map(|e| e.target)
    }

    pub fn draft(&self) -> Option<&RuleDraft> {
        self.edit.as_ref().map(|e| &e.draft)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Begin a new rule with a blank draft, discarding any edit in flight
    pub fn start_create(&mut self) -> &RuleDraft {
        self.enter_editing(EditTarget::New, RuleDraft::default())
    }

    /// Begin editing an existing rule. No-op returning `None` for unknown ids.
    pub fn start_edit(&mut self, id: RuleId) -> Option<&RuleDraft> {
        let draft = RuleDraft::from_rule(self.get(id)?);
        Some(self.enter_editing(EditTarget::Existing(id), draft))
    }

    /// Leave the edit state without saving
    pub fn cancel(&mut self) {
        self.edit = None;
    }

    /// Validate and commit `draft`.
    ///
    /// On failure the store stays in edit with `draft` as the current draft.
    /// On success an existing target is replaced in place; a new target, a
    /// target that no longer exists, or a save while idle appends a rule with
    /// a fresh id. Returns the id of the saved rule.
    ///
    /// A new rule that would need an id past `u64::MAX` is refused with
    /// [`RuleError::IdsExhausted`] and leaves the store unchanged.
    pub fn save(&mut self, draft: RuleDraft) -> Result<RuleId> {
        let target = self.edit_target().unwrap_or_else(|| {
            debug!("Save without an edit in progress, treating as create");
            EditTarget::New
        });

        let position = match target {
            EditTarget::Existing(id) => self.rules.iter().position(|r| r.id == id),
            EditTarget::New => None,
        };

        let id = match (target, position) {
            (EditTarget::Existing(id), Some(_)) => id,
            _ => self.next_id,
        };

        let rule = match draft.validate(id) {
            Ok(rule) => rule,
            Err(e) => {
                warn!("Rule draft rejected: {}", e);
                self.edit = Some(RuleEdit { target, draft });
                return Err(e);
            },
        };

        match position {
            Some(index) => {
                self.rules[index] = rule;
                info!("Rule {} updated", id);
            },
            None => {
                self.allocate_id()?;
                self.rules.push(rule);
                info!("Rule {} created", id);
            },
        }

        self.edit = None;
        Ok(id)
    }

    /// Remove a rule. Returns whether anything was removed.
    pub fn delete(&mut self, id: RuleId) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        let removed = self.rules.len() < before;
        if removed {
            info!("Rule {} deleted", id);
        }
        removed
    }

    /// Remove every rule and any edit in flight
    pub fn clear(&mut self) {
        self.rules.clear();
        self.edit = None;
    }

    /// Append rules from an import, assigning fresh ids in order.
    ///
    /// Nothing is appended when the ids would run out part way.
    pub fn append_all(&mut self, rules: Vec<Rule>) -> Result<Vec<RuleId>> {
        let first = self.next_id.max(1);
        if first.checked_add(rules.len() as RuleId).is_none() {
            return Err(RuleError::IdsExhausted(first));
        }

        let mut ids = Vec::with_capacity(rules.len());
        for mut rule in rules {
            rule.id = self.allocate_id()?;
            ids.push(rule.id);
            self.rules.push(rule);
        }
        Ok(ids)
    }

    fn enter_editing(&mut self, target: EditTarget, draft: RuleDraft) -> &RuleDraft {
        if self.is_editing() {
            debug!("Discarding draft in progress");
        }
        &self.edit.insert(RuleEdit { target, draft }).draft
    }

    fn allocate_id(&mut self) -> Result<RuleId> {
        let id = self.next_id.max(1);
        self.next_id = id.checked_add(1).ok_or(RuleError::IdsExhausted(id))?;
        Ok(id)
    }
}
