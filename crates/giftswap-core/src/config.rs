//! Roster configuration for a gift-exchange round.
//!
//! A YAML document names the participating families, lists standing
//! exclusions (families sitting this round out), and may fix a default
//! seed:
//!
//! ```yaml
//! family_names:
//!   ALPHA: "The Alphas"
//!   BRAVO: "The Bravos"
//!   CHARLIE: "The Charlies"
//! exclusions:
//!   - CHARLIE
//! seed: 2026
//! ```
//!
//! Exclusion filtering happens here, before generation: strategies only
//! ever see the filtered set.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Roster document: family ids, display names, exclusions, default seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Family id → display name. Map keys are the participant ids.
    pub family_names: BTreeMap<String, String>,

    /// Family ids excluded from every round until removed here.
    pub exclusions: Vec<String>,

    /// Default seed for reproducible rounds; CLI flags override it.
    pub seed: Option<u64>,
}

impl RosterConfig {
    /// Load a roster document from a YAML file.
    ///
    /// # Errors
    ///
    /// I/O errors for an unreadable path; YAML errors for a malformed
    /// document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        debug!(
            families = config.family_names.len(),
            exclusions = config.exclusions.len(),
            path = %path.display(),
            "loaded roster config"
        );
        Ok(config)
    }

    /// All family ids, sorted (map key order).
    pub fn family_ids(&self) -> impl Iterator<Item = &str> {
        self.family_names.keys().map(String::as_str)
    }

    /// Participant ids for a round: all families minus the config's
    /// exclusions and any `extra_exclusions`, in canonical sorted order.
    #[must_use]
    pub fn participants<S: AsRef<str>>(&self, extra_exclusions: &[S]) -> Vec<String> {
        self.family_names
            .keys()
            .filter(|id| !self.exclusions.contains(*id))
            .filter(|id| !extra_exclusions.iter().any(|x| x.as_ref() == id.as_str()))
            .cloned()
            .collect()
    }

    /// Display name for a family, falling back to the raw id.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.family_names.get(id).map_or(id, String::as_str)
    }
}
