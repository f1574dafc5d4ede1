//! Command handlers for svcrecctl.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use svcrec::{
    Change, CollectingSink, DesiredRecovery, DesiredState, ReconcileSession, RecoveryConfig, ScExe,
};
use tracing::warn;

use crate::audit::AuditEntry;
use crate::output;

/// Handle status command
pub fn handle_status(session: ReconcileSession<ScExe>, service: &str, json: bool) -> Result<()> {
    let config = session.fetch(service)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    print_config(&config);
    Ok(())
}

/// Handle list command
pub fn handle_list(mut session: ReconcileSession<ScExe>, json: bool) -> Result<()> {
    let names = session.services()?.to_vec();
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }
    for name in &names {
        println!("{}", name);
    }
    output::display_info(&format!("{} service(s)", names.len()));
    Ok(())
}

/// Handle export command
///
/// Dumps every service with recovery settings as a desired-state document,
/// ready to be checked in and fed back to diff/apply.
pub fn handle_export(
    mut session: ReconcileSession<ScExe>,
    output_path: Option<&Path>,
) -> Result<()> {
    let configs = session.fetch_all()?;
    let mut state = DesiredState::default();
    for config in &configs {
        if config.is_configured() {
            state.services.insert(
                config.name().to_string(),
                DesiredRecovery::from_config(config),
            );
        }
    }

    let document = format!(
        "# Service failure-recovery desired state\n# Exported {}\n\n{}",
        chrono::Utc::now().to_rfc3339(),
        state.to_toml()?
    );

    match output_path {
        Some(path) => {
            fs::write(path, &document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            output::display_success(&format!(
                "exported {} service(s) to {}",
                state.services.len(),
                path.display()
            ));
        }
        None => print!("{}", document),
    }
    Ok(())
}

/// Handle diff command
pub fn handle_diff(
    mut session: ReconcileSession<ScExe>,
    file: &Path,
    services: &[String],
    json: bool,
) -> Result<()> {
    let state = DesiredState::load(file)?;
    let targets = select_targets(&state, services);

    let mut plans = Vec::new();
    let mut out_of_sync = 0;
    let mut failed = 0;
    for name in &targets {
        let desired = match state.lookup(name) {
            Some(desired) => desired,
            None => {
                output::display_warning(&format!("{}: not managed by {}", name, file.display()));
                continue;
            }
        };
        if !session.service_exists(name)? {
            failed += 1;
            output::display_error(&format!("{}: unknown service", name));
            continue;
        }
        match session.plan_for(name, desired) {
            Ok(plan) => {
                if json {
                    plans.push(plan);
                    continue;
                }
                if plan.is_noop() {
                    println!("{}", plan.summary().dimmed());
                } else {
                    out_of_sync += 1;
                    println!("{}", plan.summary().yellow());
                    for change in &plan.changes {
                        print_change(change);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                output::display_error(&format!("{}: {}", name, e));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        println!();
        println!(
            "{} out of sync, {} failed, {} total",
            out_of_sync,
            failed,
            targets.len()
        );
    }
    if failed > 0 {
        anyhow::bail!("{} service(s) could not be diffed", failed);
    }
    Ok(())
}

/// Handle apply command
///
/// Reconciles every target service, continuing past per-service failures
/// so one broken service cannot block the rest of the document. Exits
/// nonzero if anything failed.
pub fn handle_apply(
    mut session: ReconcileSession<ScExe>,
    file: &Path,
    services: &[String],
    dry_run: bool,
) -> Result<()> {
    let state = DesiredState::load(file)?;
    let targets = select_targets(&state, services);
    let run_id = AuditEntry::generate_run_id();

    let mut changed = 0;
    let mut in_sync = 0;
    let mut failed = 0;

    for name in &targets {
        let desired = match state.lookup(name) {
            Some(desired) => desired,
            None => {
                output::display_warning(&format!("{}: not managed by {}", name, file.display()));
                continue;
            }
        };

        let started = Instant::now();
        if !session.service_exists(name)? {
            failed += 1;
            output::display_error(&format!("{}: unknown service", name));
            write_audit(
                &run_id,
                name,
                dry_run,
                Vec::new(),
                started,
                Some("unknown service".to_string()),
            );
            continue;
        }

        let mut sink = CollectingSink::default();
        match session.reconcile(name, desired, dry_run, &mut sink) {
            Ok(plan) if plan.is_noop() => {
                in_sync += 1;
                println!("{}", plan.summary().dimmed());
            }
            Ok(plan) => {
                changed += 1;
                if dry_run {
                    println!("{} {}", "[DRY-RUN]".cyan(), plan.summary().yellow());
                } else {
                    println!("{}", plan.summary().green());
                }
                for change in &sink.changes {
                    print_change(change);
                }
                write_audit(&run_id, name, dry_run, sink.changes, started, None);
            }
            Err(e) => {
                failed += 1;
                output::display_error(&format!("{}: {}", name, e));
                write_audit(
                    &run_id,
                    name,
                    dry_run,
                    Vec::new(),
                    started,
                    Some(e.to_string()),
                );
            }
        }
    }

    println!();
    println!("{} changed, {} in sync, {} failed", changed, in_sync, failed);
    if failed > 0 {
        anyhow::bail!("{} service(s) failed to reconcile", failed);
    }
    Ok(())
}

fn write_audit(
    run_id: &str,
    service: &str,
    dry_run: bool,
    changes: Vec<Change>,
    started: Instant,
    error: Option<String>,
) {
    let entry = AuditEntry {
        ts: AuditEntry::now(),
        run_id: run_id.to_string(),
        service: service.to_string(),
        dry_run,
        changes,
        duration_ms: started.elapsed().as_millis() as u64,
        ok: error.is_none(),
        error,
    };
    if let Err(e) = entry.write() {
        warn!("failed to write audit entry: {}", e);
    }
}

/// Services to operate on: the explicit arguments, or every service in the
/// document when none are given.
fn select_targets(state: &DesiredState, services: &[String]) -> Vec<String> {
    if services.is_empty() {
        state.services.keys().cloned().collect()
    } else {
        services.to_vec()
    }
}

fn print_config(config: &RecoveryConfig) {
    let kw = 15; // key width
    println!();
    println!("{}", config.name().bold());
    let reset = match config.reset_period {
        Some(seconds) => format!("{} seconds", seconds),
        None => "(not set)".to_string(),
    };
    print_kv("reset_period", &reset, kw);
    print_kv(
        "reboot_message",
        config.reboot_message.as_deref().unwrap_or("(not set)"),
        kw,
    );
    print_kv(
        "command",
        config.command.as_deref().unwrap_or("(not set)"),
        kw,
    );
    if config.failure_actions.is_empty() {
        print_kv("actions", "(none)", kw);
    } else {
        for (index, action) in config.failure_actions.iter().enumerate() {
            let key = if index == 0 { "actions" } else { "" };
            print_kv(
                key,
                &format!("{}. {} after {} ms", index + 1, action.kind, action.delay_ms),
                kw,
            );
        }
    }
    println!();
}

fn print_change(change: &Change) {
    match &change.old {
        Some(old) => println!("  {} {} -> {}", change.attribute, old, change.new),
        None => println!("  {} (not set) -> {}", change.attribute, change.new),
    }
}

fn print_kv(key: &str, value: &str, width: usize) {
    println!("{:width$} {}", key, value, width = width);
}
