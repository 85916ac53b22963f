//! The giver → receiver mapping produced by one generation run.
//!
//! An assignment is a derangement of the participant set: a bijection with
//! no fixed points. Strategies guarantee this by construction; the
//! validity check here is the independent oracle the auditor uses to catch
//! a strategy that fails to deliver on that guarantee.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One round of gift-exchange pairings.
///
/// Keys are givers, values are receivers. Iteration order is the sorted
/// giver order, so rendered output is stable regardless of how the
/// pairings were produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    pairs: BTreeMap<String, String>,
}

impl Assignment {
    /// Build an assignment from already-generated pairings.
    pub(crate) fn from_pairs(pairs: BTreeMap<String, String>) -> Self {
        Self { pairs }
    }

    /// The receiver assigned to `giver`, if `giver` participated.
    #[must_use]
    pub fn receiver_for(&self, giver: &str) -> Option<&str> {
        self.pairs.get(giver).map(String::as_str)
    }

    /// Iterate pairings in sorted giver order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(g, r)| (g.as_str(), r.as_str()))
    }

    /// Number of pairings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the assignment holds no pairings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Check the derangement invariant against a participant set.
    ///
    /// True iff every participant appears exactly once as giver and
    /// exactly once as receiver, and nobody is assigned to themselves.
    /// Pure check: neither the assignment nor the input is mutated.
    #[must_use]
    pub fn is_valid_for<I, S>(&self, participants: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: BTreeSet<String> = participants
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        if self.pairs.len() != ids.len() {
            return false;
        }
        for (giver, receiver) in &self.pairs {
            if giver == receiver || !ids.contains(giver) || !ids.contains(receiver) {
                return false;
            }
        }
        // Keys are unique by construction; distinct receivers of the same
        // cardinality as the id set make the mapping a bijection.
        let receivers: BTreeSet<&String> = self.pairs.values().collect();
        receivers.len() == self.pairs.len()
    }
}
