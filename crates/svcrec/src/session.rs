//! Reconciliation sessions.
//!
//! A session owns one runner and memoizes the service list, so repeated
//! lookups during a bulk reconcile cost a single `sc query`. Recovery
//! records themselves are never cached; every plan starts from a fresh
//! `sc qfailure` read.

use tracing::{debug, info};

use crate::error::RecoveryError;
use crate::model::{DesiredRecovery, RecoveryConfig};
use crate::notify::ChangeSink;
use crate::parsers::{parse_failure_status, parse_service_names};
use crate::reconcile::{plan_update, MutationPlan};
use crate::runner::ScRunner;

pub struct ReconcileSession<R: ScRunner> {
    runner: R,
    service_names: Option<Vec<String>>,
}

impl<R: ScRunner> ReconcileSession<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            service_names: None,
        }
    }

    /// The underlying runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// All installed service names, queried once per session.
    pub fn services(&mut self) -> Result<&[String], RecoveryError> {
        self.ensure_services()?;
        Ok(self.service_names.as_deref().unwrap_or(&[]))
    }

    /// Whether `name` is installed. Service names compare
    /// case-insensitively, as the service manager treats them.
    pub fn service_exists(&mut self, name: &str) -> Result<bool, RecoveryError> {
        self.ensure_services()?;
        let known = self
            .service_names
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(name));
        Ok(known)
    }

    /// Current recovery configuration of one service.
    pub fn fetch(&self, name: &str) -> Result<RecoveryConfig, RecoveryError> {
        let output = self.runner.run(&["qfailure", name])?;
        let config = parse_failure_status(name, &output);
        debug!(
            "{}: reset={:?}, {} failure action(s)",
            name,
            config.reset_period,
            config.failure_actions.len()
        );
        Ok(config)
    }

    /// Recovery configuration of every installed service, in service-list
    /// order.
    pub fn fetch_all(&mut self) -> Result<Vec<RecoveryConfig>, RecoveryError> {
        self.ensure_services()?;
        let names = self.service_names.clone().unwrap_or_default();
        let mut configs = Vec::with_capacity(names.len());
        for name in &names {
            configs.push(self.fetch(name)?);
        }
        Ok(configs)
    }

    /// Diff one service against its desired state without mutating
    /// anything.
    pub fn plan_for(
        &self,
        name: &str,
        desired: &DesiredRecovery,
    ) -> Result<MutationPlan, RecoveryError> {
        let is = self.fetch(name)?;
        Ok(plan_update(&is, desired))
    }

    /// Bring one service to its desired state.
    ///
    /// Sinks are notified once per differing attribute: after the tool
    /// reports success, or at plan time when `dry_run` is set. A failed
    /// mutation notifies nothing, since no attribute can be assumed
    /// changed.
    pub fn reconcile(
        &self,
        name: &str,
        desired: &DesiredRecovery,
        dry_run: bool,
        sink: &mut dyn ChangeSink,
    ) -> Result<MutationPlan, RecoveryError> {
        let plan = self.plan_for(name, desired)?;
        if plan.is_noop() {
            debug!("{}: already in desired state", name);
            return Ok(plan);
        }

        if dry_run {
            info!(
                "[DRY-RUN] Would execute: sc failure {} {}",
                name,
                plan.args.join(" ")
            );
            for change in &plan.changes {
                sink.notify(change);
            }
            return Ok(plan);
        }

        let mut args: Vec<&str> = Vec::with_capacity(plan.args.len() + 2);
        args.push("failure");
        args.push(name);
        args.extend(plan.args.iter().map(String::as_str));
        self.runner.run(&args)?;

        for change in &plan.changes {
            sink.notify(change);
        }
        info!("{}: applied {} change(s)", name, plan.changes.len());
        Ok(plan)
    }

    fn ensure_services(&mut self) -> Result<(), RecoveryError> {
        if self.service_names.is_none() {
            let output = self.runner.run(&["query"])?;
            let names = parse_service_names(&output);
            debug!("service list loaded: {} services", names.len());
            self.service_names = Some(names);
        }
        Ok(())
    }
}
