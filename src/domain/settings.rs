//! Persisted user settings.
//!
//! Settings are immutable values. Every change produces a new value that
//! the settings store persists before publishing it.

use serde::{Deserialize, Serialize};

/// Ordered list of action ids to run on save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Insertion order is execution order
    #[serde(rename = "commandIds", default)]
    pub command_ids: Vec<String>,
}

impl Settings {
    pub fn new(command_ids: Vec<String>) -> Self {
        Self { command_ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.command_ids.iter().any(|c| c == id)
    }

    /// Append `id` at the end. Already-present ids are left where they are.
    pub fn with_command(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.contains(id) {
            next.command_ids.push(id.to_string());
        }
        next
    }

    /// Remove every occurrence of `id`
    pub fn without_command(&self, id: &str) -> Self {
        Self {
            command_ids: self
                .command_ids
                .iter()
                .filter(|c| c.as_str() != id)
                .cloned()
                .collect(),
        }
    }

    /// Drop repeated ids, keeping the first occurrence. Returns the removed ids.
    pub fn dedup(&mut self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut removed = Vec::new();
        self.command_ids.retain(|id| {
            if seen.insert(id.clone()) {
                true
            } else {
                removed.push(id.clone());
                false
            }
        });
        removed
    }
}
