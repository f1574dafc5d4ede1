//! Desired-state documents.
//!
//! A document maps service names to the recovery attributes they should
//! have. Attributes left out of a service's table stay unmanaged.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecoveryError;
use crate::model::DesiredRecovery;

/// Desired recovery state for a set of services, keyed by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default)]
    pub services: BTreeMap<String, DesiredRecovery>,
}

impl DesiredState {
    /// Load a TOML desired-state document from disk.
    pub fn load(path: &Path) -> Result<Self, RecoveryError> {
        let text = fs::read_to_string(path).map_err(|source| RecoveryError::DesiredRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| RecoveryError::DesiredParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Desired record for `name`. Keys match case-insensitively, the way
    /// the service manager matches service names.
    pub fn lookup(&self, name: &str) -> Option<&DesiredRecovery> {
        self.services
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, desired)| desired)
    }

    /// Render back to TOML, services in name order.
    pub fn to_toml(&self) -> Result<String, RecoveryError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
