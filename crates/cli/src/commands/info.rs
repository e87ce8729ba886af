//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DispatchBlueprint, SmiType};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dispatcher: DispatcherInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<ChildInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<ScenarioInfo>,
}

#[derive(Serialize)]
struct DispatcherInfo {
    capacity: usize,
    supported_types: Vec<SmiType>,
}

#[derive(Serialize)]
struct ChildInfo {
    name: String,
    smi_type: SmiType,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
}

#[derive(Serialize)]
struct ScenarioInfo {
    interval_ms: u64,
    unregister_after: bool,
    firings: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &DispatchBlueprint, args: &InfoArgs) -> ConfigInfo {
    let children = if args.children {
        blueprint
            .children
            .iter()
            .map(|c| ChildInfo {
                name: c.name.clone(),
                smi_type: c.smi_type,
                owner: c.owner.as_ref().map(|o| o.as_str().to_string()),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dispatcher: DispatcherInfo {
            capacity: blueprint.dispatcher.capacity,
            supported_types: blueprint.dispatcher.effective_types(),
        },
        children,
        scenario: blueprint.scenario.as_ref().map(|s| ScenarioInfo {
            interval_ms: s.interval_ms,
            unregister_after: s.unregister_after,
            firings: s.events.iter().map(|e| u64::from(e.count)).sum(),
        }),
    }
}

fn print_config_info(blueprint: &DispatchBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               SMI Dispatch Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let settings = &blueprint.dispatcher;
    println!("⚙️  Dispatcher");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Capacity: {}", settings.capacity);
    if settings.supported_types.is_empty() {
        println!("   └─ Supported types: all ({})", SmiType::COUNT);
    } else {
        let names: Vec<&str> = settings.supported_types.iter().map(|t| t.name()).collect();
        println!("   └─ Supported types: {}", names.join(", "));
    }

    println!("\n🧩 Children ({})", blueprint.children.len());
    if args.children {
        for (i, child) in blueprint.children.iter().enumerate() {
            let prefix = if i == blueprint.children.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            match &child.owner {
                Some(owner) => println!("   {} {} ({}, owner {})", prefix, child.name, child.smi_type, owner),
                None => println!("   {} {} ({})", prefix, child.name, child.smi_type),
            }
        }
    }

    if let Some(scenario) = &blueprint.scenario {
        println!("\n⚡ Scenario");
        println!("   ├─ Interval: {} ms", scenario.interval_ms);
        println!("   ├─ Unregister after: {}", scenario.unregister_after);
        println!("   └─ Events ({}):", scenario.events.len());
        for event in &scenario.events {
            println!(
                "        {} x{} (status {:#x})",
                event.smi_type, event.count, event.status
            );
        }
    }

    println!();
}
