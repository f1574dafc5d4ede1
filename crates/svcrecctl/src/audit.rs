//! Audit log for svcrecctl mutations.
//!
//! Every applied (or attempted) mutation appends one JSON line, so a
//! machine's recovery-configuration history stays reviewable after the
//! fact. XDG-compliant path discovery with fallback chain.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;

use svcrec::Change;

/// Audit entry for one reconcile outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Run ID (UUID), shared by every entry of one invocation
    pub run_id: String,

    /// Service that was reconciled
    pub service: String,

    /// Whether this was a dry run
    pub dry_run: bool,

    /// Attribute changes applied, or planned in a dry run
    #[serde(default)]
    pub changes: Vec<Change>,

    /// Duration in milliseconds
    pub duration_ms: u64,

    /// Success flag
    pub ok: bool,

    /// Error details if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $SVCRECCTL_LOG_FILE environment variable (explicit override)
    /// 2. $XDG_STATE_HOME/svcrec/ctl.jsonl (XDG standard)
    /// 3. ~/.local/state/svcrec/ctl.jsonl (XDG fallback)
    fn discover_log_path() -> Option<String> {
        // 1. Explicit override
        if let Ok(path) = std::env::var("SVCRECCTL_LOG_FILE") {
            return Some(path);
        }

        // 2. XDG_STATE_HOME
        if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
            return Some(format!("{}/svcrec/ctl.jsonl", xdg_state));
        }

        // 3. HOME/.local/state fallback
        if let Ok(home) = std::env::var("HOME") {
            return Some(format!("{}/.local/state/svcrec/ctl.jsonl", home));
        }

        None
    }

    /// Write audit entry to file, falling back to stdout on failure
    pub fn write(&self) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(self)?;

        if let Some(path) = Self::discover_log_path() {
            match Self::write_to_file(&json, &path) {
                Ok(()) => return Ok(()),
                Err(_) => {
                    // Silently fall back to stdout
                    println!("{}", json);
                    return Ok(());
                }
            }
        }

        // No path available, write to stdout
        println!("{}", json);
        Ok(())
    }

    /// Attempt to write audit entry to file
    fn write_to_file(json: &str, path: &str) -> Result<(), std::io::Error> {
        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Generate run ID
    pub fn generate_run_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Get current timestamp in ISO 8601 format
    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
