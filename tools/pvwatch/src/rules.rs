//! Rule management commands

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use colored::*;
use pv_alerts::{AlertError, Monitor, StateStore};
use pv_model::Severity;
use pv_rules::{load_rules_file, save_rules_file, Condition, Metric, RuleDraft, RuleId};
use tracing::info;

use crate::output::{print_rules, rule_line};

#[derive(Subcommand)]
pub enum RuleCommands {
    /// List rules in evaluation order
    List,

    /// Create a rule
    Add {
        #[command(flatten)]
        fields: RuleFields,
    },

    /// Change an existing rule; unset fields keep their value
    Edit {
        /// Rule ID
        rule_id: RuleId,

        #[command(flatten)]
        fields: RuleFields,
    },

    /// Delete a rule (no-op if absent)
    Delete {
        /// Rule ID
        rule_id: RuleId,
    },

    /// Append rules from a YAML or JSON file
    Import {
        file: PathBuf,
    },

    /// Write all rules to a YAML or JSON file
    Export {
        file: PathBuf,
    },

    /// Delete every rule
    Clear,
}

/// Form fields of a rule
#[derive(Args, Debug, Default)]
pub struct RuleFields {
    /// power or voltage
    #[arg(short, long)]
    pub metric: Option<Metric>,

    /// lt, gt or eq (also <, >, =)
    #[arg(short, long)]
    pub condition: Option<Condition>,

    /// Threshold value
    #[arg(short, long, allow_hyphen_values = true)]
    pub threshold: Option<String>,

    /// warning or critical
    #[arg(short, long)]
    pub severity: Option<Severity>,

    /// Alert text shown when the rule matches
    #[arg(short = 'M', long)]
    pub message: Option<String>,
}

impl RuleFields {
    /// Overlay the given fields onto a draft
    pub fn apply(self, mut draft: RuleDraft) -> RuleDraft {
        if let Some(metric) = self.metric {
            draft.metric = metric;
        }
        if let Some(condition) = self.condition {
            draft.condition = condition;
        }
        if let Some(threshold) = self.threshold {
            draft.threshold = threshold;
        }
        if let Some(severity) = self.severity {
            draft.severity = severity;
        }
        if let Some(message) = self.message {
            draft.message = message;
        }
        draft
    }
}

pub fn handle_command<S: StateStore>(cmd: RuleCommands, monitor: &mut Monitor<S>) -> Result<()> {
    match cmd {
        RuleCommands::List => print_rules(monitor.rules()),
        RuleCommands::Add { fields } => {
            let draft = fields.apply(monitor.start_create());
            let id = save(monitor, draft)?;
            print_saved(monitor, id, "Created");
        },
        RuleCommands::Edit { rule_id, fields } => {
            let Some(current) = monitor.start_edit(rule_id) else {
                bail!("Rule {} not found", rule_id);
            };
            let id = save(monitor, fields.apply(current))?;
            print_saved(monitor, id, "Updated");
        },
        RuleCommands::Delete { rule_id } => {
            if monitor.delete_rule(rule_id)? {
                println!("{} rule #{}", "Deleted".bright_green(), rule_id);
            } else {
                println!("{} rule #{} does not exist", "Skipped:".yellow(), rule_id);
            }
        },
        RuleCommands::Import { file } => {
            let rules = load_rules_file(&file)?;
            let ids = monitor.import_rules(rules)?;
            println!(
                "{} {} rules from {}",
                "Imported".bright_green(),
                ids.len(),
                file.display()
            );
        },
        RuleCommands::Export { file } => {
            save_rules_file(&file, monitor.rules().rules())?;
            info!("Rules exported to {}", file.display());
            println!(
                "{} {} rules to {}",
                "Exported".bright_green(),
                monitor.rules().len(),
                file.display()
            );
        },
        RuleCommands::Clear => {
            let count = monitor.rules().len();
            monitor.clear_rules()?;
            println!("{} {} rules", "Cleared".bright_green(), count);
        },
    }
    Ok(())
}

fn save<S: StateStore>(monitor: &mut Monitor<S>, draft: RuleDraft) -> Result<RuleId> {
    match monitor.save_rule(draft) {
        Ok(id) => Ok(id),
        Err(e) => {
            // a one-shot command has nowhere to keep the rejected draft
            monitor.cancel_edit();
            if let AlertError::Rule(ref inner) = e {
                if inner.is_validation() {
                    bail!("Rule rejected: {}", inner);
                }
            }
            Err(e.into())
        },
    }
}

fn print_saved<S: StateStore>(monitor: &Monitor<S>, id: RuleId, verb: &str) {
    if let Some(rule) = monitor.rules().get(id) {
        println!("{} {}", verb.bright_green(), rule_line(rule));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_alerts::{MemoryStore, MonitorSettings};

    fn monitor() -> Monitor<MemoryStore> {
        Monitor::open(MemoryStore::new(), MonitorSettings::default()).unwrap()
    }

    fn fields(threshold: &str, message: &str) -> RuleFields {
        RuleFields {
            threshold: Some(threshold.to_string()),
            message: Some(message.to_string()),
            ..RuleFields::default()
        }
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let base = RuleDraft {
            metric: Metric::Voltage,
            condition: Condition::Gt,
            threshold: "250".to_string(),
            severity: Severity::Critical,
            message: "over".to_string(),
        };
        let draft = RuleFields {
            threshold: Some("260".to_string()),
            ..RuleFields::default()
        }
        .apply(base);

        assert_eq!(draft.metric, Metric::Voltage);
        assert_eq!(draft.threshold, "260");
        assert_eq!(draft.message, "over");
    }

    #[test]
    fn test_add_then_edit() {
        let mut m = monitor();
        handle_command(RuleCommands::Add { fields: fields("100", "low output") }, &mut m).unwrap();
        assert_eq!(m.rules().len(), 1);

        let edit = RuleCommands::Edit {
            rule_id: 1,
            fields: RuleFields {
                severity: Some(Severity::Critical),
                ..RuleFields::default()
            },
        };
        handle_command(edit, &mut m).unwrap();

        let rule = m.rules().get(1).unwrap();
        assert_eq!(rule.severity, Severity::Critical);
        assert_eq!(rule.threshold, 100.0);
    }

    #[test]
    fn test_rejected_add_leaves_no_edit() {
        let mut m = monitor();
        let err = handle_command(RuleCommands::Add { fields: fields("abc", "x") }, &mut m)
            .unwrap_err();
        assert!(err.to_string().contains("Rule rejected"));
        assert!(m.rules().is_empty());
        assert!(m.edit_target().is_none());
    }

    #[test]
    fn test_edit_unknown_rule() {
        let mut m = monitor();
        let cmd = RuleCommands::Edit {
            rule_id: 9,
            fields: RuleFields::default(),
        };
        assert!(handle_command(cmd, &mut m).is_err());
    }
}
