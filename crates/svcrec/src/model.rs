//! Typed records for service failure-recovery configuration.
//!
//! `RecoveryConfig` is the "is" state read back from the service-control
//! tool; `DesiredRecovery` is the "should" state supplied by a desired-state
//! document. Both use presence/absence to distinguish "not configured" from
//! a configured value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the service manager does on one failure occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureActionKind {
    /// Restart the service.
    Restart,
    /// Reboot the machine (broadcasting the configured reboot message).
    Reboot,
    /// Run the configured failure command.
    RunCommand,
    /// Take no action for this occurrence.
    Noop,
}

impl FailureActionKind {
    /// Token used by the tool's `actions=` grammar. `Noop` is encoded as
    /// an empty token and is never read back from status output.
    pub fn token(&self) -> &'static str {
        match self {
            FailureActionKind::Restart => "restart",
            FailureActionKind::Reboot => "reboot",
            FailureActionKind::RunCommand => "run",
            FailureActionKind::Noop => "",
        }
    }
}

impl fmt::Display for FailureActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureActionKind::Restart => "restart",
            FailureActionKind::Reboot => "reboot",
            FailureActionKind::RunCommand => "run_command",
            FailureActionKind::Noop => "noop",
        };
        write!(f, "{}", name)
    }
}

/// One escalation step within the reset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureAction {
    pub kind: FailureActionKind,
    /// Milliseconds to wait before performing the action.
    pub delay_ms: u64,
}

impl FailureAction {
    pub fn new(kind: FailureActionKind, delay_ms: u64) -> Self {
        Self { kind, delay_ms }
    }
}

/// Failure-recovery configuration of one service, as read back from the
/// service-control tool.
///
/// A record with no recognized recovery data is valid: every optional field
/// stays absent and `failure_actions` stays empty. The action order is the
/// tool's escalation order (1st failure, 2nd failure, ...) and is preserved
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    name: String,
    /// Seconds after which the failure counter resets; absent if not found
    /// in status text.
    pub reset_period: Option<u64>,
    /// Message broadcast before a reboot action.
    pub reboot_message: Option<String>,
    /// Command line executed by a run-command action.
    pub command: Option<String>,
    pub failure_actions: Vec<FailureAction>,
}

impl RecoveryConfig {
    /// New record with nothing configured.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reset_period: None,
            reboot_message: None,
            command: None,
            failure_actions: Vec::new(),
        }
    }

    /// Service identifier. Immutable once constructed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if any recovery attribute is set.
    pub fn is_configured(&self) -> bool {
        self.reset_period.is_some()
            || self.reboot_message.is_some()
            || self.command.is_some()
            || !self.failure_actions.is_empty()
    }
}

/// Desired ("should") state for one service.
///
/// Absence means "do not manage this attribute": a `None` scalar or an empty
/// action list leaves the corresponding attribute untouched during
/// reconciliation. There is deliberately no way to express "clear this
/// attribute" here; the underlying tool has no such operation either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecovery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_period: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reboot_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_actions: Vec<FailureAction>,
}

impl DesiredRecovery {
    /// True if no attribute is managed.
    pub fn is_unmanaged(&self) -> bool {
        self.reset_period.is_none()
            && self.reboot_message.is_none()
            && self.command.is_none()
            && self.failure_actions.is_empty()
    }

    /// Desired record that would reproduce `config` as-is. Used by the
    /// export surface to turn current state into a desired-state template.
    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self {
            reset_period: config.reset_period,
            reboot_message: config.reboot_message.clone(),
            command: config.command.clone(),
            failure_actions: config.failure_actions.clone(),
        }
    }
}
