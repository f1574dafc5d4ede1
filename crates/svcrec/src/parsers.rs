//! Output parsers for the service-control tool.
//!
//! Parses stdout from `sc qfailure` and `sc query`. The status format is
//! line oriented: labeled scalar lines followed by one action line per
//! escalation step, with the first action sharing the FAILURE_ACTIONS
//! label line.

use tracing::warn;

use crate::model::{FailureAction, FailureActionKind, RecoveryConfig};

const RESET_PERIOD_LABEL: &str = "RESET_PERIOD (in seconds)";
const REBOOT_MESSAGE_LABEL: &str = "REBOOT_MESSAGE";
const COMMAND_LINE_LABEL: &str = "COMMAND_LINE";

/// Parse `sc qfailure <name>` output into a recovery record.
///
/// Scalars take the first value-bearing occurrence; a labeled line with an
/// empty value sets nothing. Action lines append in the order printed,
/// which is the tool's escalation order. A line is classified at most once:
/// labels are tried before action tokens, so a REBOOT_MESSAGE line never
/// doubles as a reboot action. Lines whose numeric part does not parse are
/// dropped with a warning rather than failing the whole record.
pub fn parse_failure_status(name: &str, output: &str) -> RecoveryConfig {
    let mut config = RecoveryConfig::new(name);

    for line in output.lines() {
        if let Some(value) = labeled_value(line, RESET_PERIOD_LABEL) {
            if config.reset_period.is_none() && !value.is_empty() {
                match value.parse() {
                    Ok(seconds) => config.reset_period = Some(seconds),
                    Err(_) => warn!("ignoring unparseable reset period line: {}", line.trim()),
                }
            }
        } else if let Some(value) = labeled_value(line, REBOOT_MESSAGE_LABEL) {
            if config.reboot_message.is_none() && !value.is_empty() {
                config.reboot_message = Some(value.to_string());
            }
        } else if let Some(value) = labeled_value(line, COMMAND_LINE_LABEL) {
            if config.command.is_none() && !value.is_empty() {
                config.command = Some(value.to_string());
            }
        } else if line.contains("RESTART") {
            push_action(&mut config, line, "RESTART", FailureActionKind::Restart);
        } else if line.contains("RUN PROCESS") {
            push_action(&mut config, line, "RUN PROCESS", FailureActionKind::RunCommand);
        } else if line.contains("REBOOT") {
            push_action(&mut config, line, "REBOOT", FailureActionKind::Reboot);
        }
    }

    config
}

/// Parse `sc query` output into the list of service names, in output order.
pub fn parse_service_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("SERVICE_NAME:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Value of a `LABEL : value` line, or None if the line does not start
/// with that label (leading whitespace ignored).
fn labeled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix(label)?.trim_start();
    Some(rest.strip_prefix(':')?.trim())
}

/// Delay in milliseconds from an action line such as
/// `RESTART -- Delay = 5000 milliseconds.` Decorations between the token
/// and the number are optional; the number itself is not.
fn action_delay(line: &str, token: &str) -> Option<u64> {
    let start = line.find(token)? + token.len();
    let mut rest = line[start..].trim_start();
    if let Some(stripped) = rest.strip_prefix("--") {
        rest = stripped.trim_start();
    }
    if let Some(stripped) = rest.strip_prefix("Delay") {
        rest = stripped.trim_start();
    }
    if let Some(stripped) = rest.strip_prefix('=') {
        rest = stripped.trim_start();
    }
    rest.split_whitespace().next()?.parse().ok()
}

fn push_action(config: &mut RecoveryConfig, line: &str, token: &str, kind: FailureActionKind) {
    match action_delay(line, token) {
        Some(delay_ms) => config.failure_actions.push(FailureAction::new(kind, delay_ms)),
        None => warn!("ignoring action line without a readable delay: {}", line.trim()),
    }
}
