//! `validate` command implementation.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use contracts::{DispatchBlueprint, SmiType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    capacity: usize,
    supported_types: usize,
    child_count: usize,
    scenario_events: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    match result.error {
        None => Ok(()),
        Some(message) => Err(CliError::config_validation(message).into()),
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(CliError::config_not_found(&args.config).to_string()),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&blueprint),
            summary: Some(ConfigSummary {
                version: format!("{:?}", blueprint.version),
                capacity: blueprint.dispatcher.capacity,
                supported_types: blueprint.dispatcher.effective_types().len(),
                child_count: blueprint.children.len(),
                scenario_events: blueprint
                    .scenario
                    .as_ref()
                    .map_or(0, |s| s.events.iter().map(|e| e.count as usize).sum()),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &DispatchBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.children.is_empty() {
        warnings.push("No children configured - every source stays disabled".to_string());
    }

    let listened: BTreeSet<SmiType> = blueprint.children.iter().map(|c| c.smi_type).collect();
    if let Some(scenario) = &blueprint.scenario {
        for event in &scenario.events {
            if !listened.contains(&event.smi_type) {
                warnings.push(format!(
                    "Scenario fires '{}' but no child listens for it",
                    event.smi_type
                ));
            }
        }
        if !scenario.unregister_after {
            warnings.push("scenario.unregister_after is false - sources stay armed".to_string());
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Capacity: {}", summary.capacity);
            println!("  Supported types: {}", summary.supported_types);
            println!("  Children: {}", summary.child_count);
            println!("  Scenario firings: {}", summary.scenario_events);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::ConfigFormat;
    use std::io::Write;

    fn blueprint(content: &str) -> DispatchBlueprint {
        config_loader::ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap()
    }

    #[test]
    fn test_warns_on_unheard_event() {
        let bp = blueprint(
            r#"
[[children]]
name = "pme"
smi_type = "pme"

[scenario]
[[scenario.events]]
smi_type = "nmi"
"#,
        );
        let warnings = collect_warnings(&bp);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'nmi'"));
    }

    #[test]
    fn test_warns_on_empty_children() {
        let warnings = collect_warnings(&blueprint("[dispatcher]\ncapacity = 4\n"));
        assert!(warnings[0].contains("No children"));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/dispatch.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_valid_file_summary() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[dispatcher]
capacity = 8

[[children]]
name = "watchdog"
smi_type = "tco_timeout"

[scenario]
[[scenario.events]]
smi_type = "tco_timeout"
count = 3
"#,
        )
        .unwrap();

        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(result.valid, "error: {:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.capacity, 8);
        assert_eq!(summary.supported_types, SmiType::COUNT);
        assert_eq!(summary.scenario_events, 3);
    }
}
