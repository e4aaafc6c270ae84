//! Rule files - YAML/JSON import and export of rule lists
//!
//! File format is picked from the extension (`.yaml`/`.yml`/`.json`).

use crate::error::{Result, RuleError};
use crate::types::Rule;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleFileFormat {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<RuleFileFormat> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "yaml" | "yml" => Ok(RuleFileFormat::Yaml),
        "json" => Ok(RuleFileFormat::Json),
        other => Err(RuleError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}

/// Load a rule list from a YAML or JSON file
pub fn load_rules_file(path: impl AsRef<Path>) -> Result<Vec<Rule>> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let content = fs::read_to_string(path)?;

    let rules: Vec<Rule> = match format {
        RuleFileFormat::Yaml => serde_yaml::from_str(&content)?,
        RuleFileFormat::Json => serde_json::from_str(&content)?,
    };

    for rule in &rules {
        if !rule.threshold.is_finite() {
            return Err(RuleError::validation(
                "threshold",
                format!("rule {} has a non-finite threshold", rule.id),
            ));
        }
    }

    info!("Loaded {} rule(s) from {}", rules.len(), path.display());
    Ok(rules)
}

/// Write a rule list to a YAML or JSON file
pub fn save_rules_file(path: impl AsRef<Path>, rules: &[Rule]) -> Result<()> {
    let path = path.as_ref();
    let content = match format_of(path)? {
        RuleFileFormat::Yaml => serde_yaml::to_string(rules)?,
        RuleFileFormat::Json => serde_json::to_string_pretty(rules)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    info!("Saved {} rule(s) to {}", rules.len(), path.display());
    Ok(())
}
