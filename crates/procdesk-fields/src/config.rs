//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tunables shared by form sessions and the assembly service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Re-validate a field as soon as its answer changes
    pub validate_on_change: bool,
    /// Maximum rows requested per lookup
    pub lookup_row_limit: usize,
    /// Soft bound on distinct lookups cached per session
    pub lookup_cache_capacity: u64,
    /// Label of the single section shown when nothing is assigned
    pub fallback_section_label: String,
    /// Label of the section holding unassigned fields
    pub general_section_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            lookup_row_limit: 500,
            lookup_cache_capacity: 1024,
            fallback_section_label: "Fields".to_string(),
            general_section_label: "General".to_string(),
        }
    }
}
