//! Diffing current against desired recovery state.
//!
//! The tool's mutation grammar couples two attributes: `reset=` and
//! `actions=` are only valid together, so if either differs the plan sends
//! both, filling the other side from current state. Scalars travel alone.

use serde::Serialize;

use crate::model::{DesiredRecovery, FailureAction, RecoveryConfig};
use crate::notify::Change;

/// Planned mutation for one service.
///
/// `changes` lists only the attributes that actually differ; `args` is what
/// gets passed to `sc failure <service>` and may be wider than `changes`
/// because of the reset/actions pairing.
#[derive(Debug, Clone, Serialize)]
pub struct MutationPlan {
    pub service: String,
    pub changes: Vec<Change>,
    pub args: Vec<String>,
}

impl MutationPlan {
    /// True if current state already matches desired state.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// One-line summary for status output.
    pub fn summary(&self) -> String {
        if self.is_noop() {
            format!("{}: in sync", self.service)
        } else {
            let attrs: Vec<&str> = self
                .changes
                .iter()
                .map(|change| change.attribute.as_str())
                .collect();
            format!("{}: update {}", self.service, attrs.join(", "))
        }
    }
}

/// Diff `is` against `should` and build the mutation arguments.
///
/// Absent desired attributes are unmanaged and never compared, so a
/// desired record with nothing set always produces a no-op plan.
pub fn plan_update(is: &RecoveryConfig, should: &DesiredRecovery) -> MutationPlan {
    let mut changes = Vec::new();
    let mut args = Vec::new();

    if let Some(message) = &should.reboot_message {
        if is.reboot_message.as_ref() != Some(message) {
            changes.push(Change::new(
                is.name(),
                "reboot_message",
                is.reboot_message.clone(),
                message.clone(),
            ));
            args.push(format!("reboot=\"{}\"", message));
        }
    }

    if let Some(command) = &should.command {
        if is.command.as_ref() != Some(command) {
            changes.push(Change::new(
                is.name(),
                "command",
                is.command.clone(),
                command.clone(),
            ));
            args.push(format!("command=\"{}\"", command));
        }
    }

    let reset_differs = should.reset_period.is_some() && should.reset_period != is.reset_period;
    let actions_differ =
        !should.failure_actions.is_empty() && should.failure_actions != is.failure_actions;

    if reset_differs || actions_differ {
        if reset_differs {
            changes.push(Change::new(
                is.name(),
                "reset_period",
                is.reset_period.map(|seconds| seconds.to_string()),
                should.reset_period.unwrap_or(0).to_string(),
            ));
        }
        if actions_differ {
            let old = if is.failure_actions.is_empty() {
                None
            } else {
                Some(encode_actions(&is.failure_actions))
            };
            changes.push(Change::new(
                is.name(),
                "failure_actions",
                old,
                encode_actions(&should.failure_actions),
            ));
        }

        // Pair rule: whichever side is not being changed is re-sent from
        // current state. An unknown current reset period is re-sent as 0.
        let reset = should.reset_period.or(is.reset_period).unwrap_or(0);
        let actions = if should.failure_actions.is_empty() {
            &is.failure_actions
        } else {
            &should.failure_actions
        };
        args.push(format!("reset={}", reset));
        args.push(format!("actions={}", encode_actions(actions)));
    }

    MutationPlan {
        service: is.name().to_string(),
        changes,
        args,
    }
}

/// Encode an action list for the `actions=` argument.
///
/// Each step becomes `<token>/<delay_ms>` and the whole list carries a
/// trailing slash, so `[restart 1000, reboot 5000]` encodes to
/// `restart/1000/reboot/5000/`. A no-action step has an empty token and
/// encodes to `/<delay_ms>`. An empty list encodes to an empty string.
pub fn encode_actions(actions: &[FailureAction]) -> String {
    if actions.is_empty() {
        return String::new();
    }
    let encoded: Vec<String> = actions
        .iter()
        .map(|action| format!("{}/{}", action.kind.token(), action.delay_ms))
        .collect();
    format!("{}/", encoded.join("/"))
}
