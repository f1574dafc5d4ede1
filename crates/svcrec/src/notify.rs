//! Change notifications for applied (or about-to-be-applied) mutations.
//!
//! Sinks receive one `Change` per attribute that actually differed. During
//! a real apply they fire after the tool reports success; in dry-run mode
//! they fire at plan time, since nothing is ever executed.

use serde::{Deserialize, Serialize};
use tracing::info;

/// One attribute-level difference between current and desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub service: String,
    /// Attribute name: reset_period, reboot_message, command or
    /// failure_actions.
    pub attribute: String,
    /// Previous value, absent if the attribute was not configured.
    /// Action lists appear in their encoded form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    pub new: String,
}

impl Change {
    pub fn new(
        service: impl Into<String>,
        attribute: impl Into<String>,
        old: Option<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            attribute: attribute.into(),
            old,
            new: new.into(),
        }
    }
}

/// Receives change notifications during reconciliation.
pub trait ChangeSink {
    fn notify(&mut self, change: &Change);
}

/// Sink that reports changes through the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogSink;

impl ChangeSink for LogSink {
    fn notify(&mut self, change: &Change) {
        match &change.old {
            Some(old) => info!(
                "{}: {} changed from {} to {}",
                change.service, change.attribute, old, change.new
            ),
            None => info!(
                "{}: {} set to {}",
                change.service, change.attribute, change.new
            ),
        }
    }
}

/// Sink that collects changes for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub changes: Vec<Change>,
}

impl ChangeSink for CollectingSink {
    fn notify(&mut self, change: &Change) {
        self.changes.push(change.clone());
    }
}
