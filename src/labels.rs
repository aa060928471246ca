//! Label registry: the ordered label set and per-image assignments
//!
//! The label set always contains the built-in `"None"` label in first
//! position. `"None"` doubles as the unlabeled sentinel: every extracted
//! image starts assigned to it, and removing a user label reassigns its
//! images back to it.

use std::collections::HashMap;

use crate::error::{AppError, Result};

/// Built-in label every image starts with. Cannot be removed.
pub const DEFAULT_LABEL: &str = "None";

/// Longest accepted label name, in characters.
pub const MAX_LABEL_LEN: usize = 100;

/// Ordered, duplicate-free set of label names
#[derive(Debug, Clone)]
pub struct LabelSet {
    names: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            names: vec![DEFAULT_LABEL.to_string()],
        }
    }
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels in insertion order, `"None"` first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, label: &str) -> bool {
        self.names.iter().any(|name| name == label)
    }

    /// Add a label to the end of the set. The name is trimmed before any
    /// other check.
    pub fn add(&mut self, label: &str) -> Result<()> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidLabel("label must not be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_LABEL_LEN {
            return Err(AppError::InvalidLabel(format!(
                "label exceeds {} characters",
                MAX_LABEL_LEN
            )));
        }
        if self.contains(trimmed) {
            return Err(AppError::AlreadyExists(trimmed.to_string()));
        }
        self.names.push(trimmed.to_string());
        Ok(())
    }

    /// Remove a user-defined label. The built-in label is protected.
    pub fn remove(&mut self, label: &str) -> Result<()> {
        if label == DEFAULT_LABEL {
            return Err(AppError::ProtectedLabel(label.to_string()));
        }
        if !self.contains(label) {
            return Err(AppError::UnknownLabel(label.to_string()));
        }
        self.names.retain(|name| name != label);
        Ok(())
    }
}

/// Mapping from image id to its current label
///
/// The map holds an entry for every image in the session, so membership in
/// the map is also the authority on which ids exist.
#[derive(Debug, Clone, Default)]
pub struct LabelAssignments {
    by_id: HashMap<u64, String>,
}

impl LabelAssignments {
    /// Build assignments for a fresh session; every id starts unlabeled.
    pub fn for_ids(ids: impl Iterator<Item = u64>) -> Self {
        Self {
            by_id: ids.map(|id| (id, DEFAULT_LABEL.to_string())).collect(),
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Current label for an id, or the unlabeled sentinel for unknown ids.
    pub fn label_of(&self, id: u64) -> &str {
        self.by_id.get(&id).map(String::as_str).unwrap_or(DEFAULT_LABEL)
    }

    /// Assign `label` to `id`. Returns false when the id is not part of the
    /// session.
    pub fn set(&mut self, id: u64, label: &str) -> bool {
        match self.by_id.get_mut(&id) {
            Some(slot) => {
                *slot = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Move every image carrying `label` back to the unlabeled sentinel.
    /// Returns how many images were reassigned.
    pub fn clear_label(&mut self, label: &str) -> usize {
        let mut reassigned = 0;
        for slot in self.by_id.values_mut() {
            if slot == label {
                *slot = DEFAULT_LABEL.to_string();
                reassigned += 1;
            }
        }
        reassigned
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
