//! `simulate` command implementation.
//!
//! Builds an engine over `LogTrigger`, registers every configured child with a
//! `LogHandler`, then fires the scenario from a tokio task.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{DispatchBlueprint, DispatchHandle, FireEvent, FiringDetails, OwnerId};
use dispatcher::{create_engine, DispatchEngine, LogHandler, LogTrigger};
use observability::DispatchMetricsAggregator;
use tracing::{info, warn};

use crate::cli::SimulateArgs;
use crate::error::CliError;

type Engine = DispatchEngine<LogTrigger, String>;

/// A child registered for the run
#[derive(Debug)]
struct RegisteredChild {
    name: String,
    handle: DispatchHandle,
    owner: Option<OwnerId>,
    hits: Arc<AtomicU64>,
}

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let engine: Arc<Engine> = Arc::new(create_engine(
        &blueprint.dispatcher,
        LogTrigger::new("simulate"),
    ));
    let children = register_children(&engine, &blueprint)?;

    info!(
        children = children.len(),
        sources = engine.active_types().len(),
        "Children registered"
    );

    let (interval, events) = scenario_events(&blueprint);
    let firing = tokio::spawn(fire_events(Arc::clone(&engine), interval, events));
    let abort = firing.abort_handle();

    let timeout = async {
        if args.timeout == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(args.timeout)).await;
        }
    };

    let aggregator = tokio::select! {
        joined = firing => Some(joined.context("Scenario task failed")?),
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping simulation...");
            abort.abort();
            None
        }
        _ = timeout => {
            abort.abort();
            let err = CliError::Timeout { secs: args.timeout };
            warn!(error = %err, "Stopping simulation");
            None
        }
    };

    let unregister_after = blueprint
        .scenario
        .as_ref()
        .map_or(true, |s| s.unregister_after);
    if unregister_after {
        unregister_children(&engine, &children);
    }

    let snapshot = engine.metrics().snapshot();
    observability::record_dispatch_metrics(
        &snapshot,
        engine.registration_count(),
        engine.active_types().len(),
    );

    print_stats(&engine, &children, aggregator.as_ref());
    info!("SMI Dispatch simulation finished");
    Ok(())
}

fn register_children(engine: &Engine, blueprint: &DispatchBlueprint) -> Result<Vec<RegisteredChild>> {
    let mut registered = Vec::with_capacity(blueprint.children.len());
    for child in &blueprint.children {
        let handler = LogHandler::new(child.name.clone());
        let hits = handler.hits();

        let result = match &child.owner {
            Some(owner) => {
                engine.register_owned(owner.clone(), child.smi_type, handler, child.name.clone())
            }
            None => engine.register(child.smi_type, handler, child.name.clone()),
        };
        observability::record_registration(child.smi_type, result.is_ok());

        let handle = match result {
            Ok(handle) => handle,
            Err(e) => {
                warn!(child = %child.name, registered = registered.len(), "Registration failed, rolling back");
                unregister_children(engine, &registered);
                return Err(CliError::registration(&child.name, e).into());
            }
        };
        registered.push(RegisteredChild {
            name: child.name.clone(),
            handle,
            owner: child.owner.clone(),
            hits,
        });
    }
    Ok(registered)
}

/// Scenario events, or one firing per listened sub-type when none is configured
fn scenario_events(blueprint: &DispatchBlueprint) -> (Duration, Vec<FireEvent>) {
    match &blueprint.scenario {
        Some(scenario) => (
            Duration::from_millis(scenario.interval_ms),
            scenario.events.clone(),
        ),
        None => {
            let types: BTreeSet<_> = blueprint.children.iter().map(|c| c.smi_type).collect();
            let events = types
                .into_iter()
                .map(|smi_type| FireEvent {
                    smi_type,
                    count: 1,
                    status: 0,
                })
                .collect();
            (Duration::from_millis(10), events)
        }
    }
}

async fn fire_events(
    engine: Arc<Engine>,
    interval: Duration,
    events: Vec<FireEvent>,
) -> DispatchMetricsAggregator {
    let mut aggregator = DispatchMetricsAggregator::new();
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));

    for event in events {
        for _ in 0..event.count {
            ticker.tick().await;

            let started = Instant::now();
            let calls = engine.invoke(event.smi_type, FiringDetails::with_status(event.status));
            let latency_us = started.elapsed().as_secs_f64() * 1e6;

            aggregator.update(event.smi_type, calls, latency_us);
            observability::record_invoke(event.smi_type, calls, latency_us);
        }
    }
    aggregator
}

fn unregister_children(engine: &Engine, children: &[RegisteredChild]) {
    let owners: BTreeSet<&str> = children
        .iter()
        .filter_map(|c| c.owner.as_ref().map(OwnerId::as_str))
        .collect();
    for owner in owners {
        let removed = engine.unregister_owner(&OwnerId::from(owner));
        info!(owner, removed, "Owner unregistered");
    }

    for child in children.iter().filter(|c| c.owner.is_none()) {
        if let Err(e) = engine.unregister(child.handle) {
            warn!(child = %child.name, error = %e, "Unregister failed");
        }
    }

    let armed = engine.trigger().armed_count();
    if armed != 0 {
        warn!(armed, "Sources still armed after unregistering every child");
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_stats(engine: &Engine, children: &[RegisteredChild], aggregator: Option<&DispatchMetricsAggregator>) {
    let snapshot = engine.metrics().snapshot();

    println!("\n=== Dispatch Statistics ===");
    println!("Registrations: {}", snapshot.registrations);
    println!("Unregistrations: {}", snapshot.unregistrations);
    println!("Live registrations: {}", engine.registration_count());
    println!("Invocations: {} (+{} idle)", snapshot.invocations, snapshot.idle_invocations);
    println!("Handler calls: {}", snapshot.handler_calls);
    println!("Handler failures: {}", snapshot.handler_failures);
    println!(
        "Trigger failures: enable={}, disable={}",
        snapshot.enable_failures, snapshot.disable_failures
    );

    if !children.is_empty() {
        println!("\nChild hits:");
        for child in children {
            println!(
                "  {} ({}): {}",
                child.name,
                child.handle,
                child.hits.load(Ordering::Relaxed)
            );
        }
    }

    match aggregator {
        Some(aggregator) => println!("\n{}", aggregator.summary()),
        None => println!("\nScenario interrupted before completion"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::ConfigFormat;
    use contracts::SmiType;

    fn blueprint(content: &str) -> DispatchBlueprint {
        config_loader::ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap()
    }

    const CONFIG: &str = r#"
[dispatcher]
capacity = 4

[[children]]
name = "watchdog"
smi_type = "tco_timeout"

[[children]]
name = "usb-a"
smi_type = "intel_usb2"
owner = "usb"

[[children]]
name = "usb-b"
smi_type = "intel_usb2"
owner = "usb"
"#;

    #[test]
    fn test_default_scenario_fires_each_listened_type_once() {
        let (_, events) = scenario_events(&blueprint(CONFIG));
        let types: Vec<SmiType> = events.iter().map(|e| e.smi_type).collect();
        assert_eq!(types, vec![SmiType::TcoTimeout, SmiType::IntelUsb2]);
    }

    #[tokio::test]
    async fn test_register_fire_unregister() {
        let bp = blueprint(CONFIG);
        let engine: Arc<Engine> = Arc::new(create_engine(&bp.dispatcher, LogTrigger::new("t")));

        let children = register_children(&engine, &bp).unwrap();
        assert_eq!(engine.trigger().armed_count(), 2);

        let (_, events) = scenario_events(&bp);
        let aggregator = fire_events(Arc::clone(&engine), Duration::from_millis(1), events).await;
        assert_eq!(aggregator.total_invocations, 2);
        assert!(children.iter().all(|c| c.hits.load(Ordering::Relaxed) == 1));

        unregister_children(&engine, &children);
        assert_eq!(engine.registration_count(), 0);
        assert_eq!(engine.trigger().armed_count(), 0);
    }

    #[test]
    fn test_registration_error_names_child() {
        let bp = blueprint(CONFIG);
        let settings = contracts::DispatcherSettings {
            capacity: 1,
            supported_types: Vec::new(),
        };
        let engine: Engine = create_engine(&settings, LogTrigger::new("t"));

        let err = register_children(&engine, &bp).unwrap_err();
        assert!(err.to_string().contains("usb-a"), "got: {err}");

        assert_eq!(engine.registration_count(), 0);
        assert_eq!(engine.trigger().armed_count(), 0);
        assert!(engine.active_types().is_empty());
    }
}
