//! Deduplicating event-kind and role catalogs.
//!
//! Every synthesized event registers its kind and both roles here. Keys are
//! derived (`event-kind-<kind>`, `role-<role>`); the catalogs grow
//! monotonically and a re-registration overwrites the previous label
//! (idempotent, last-write-wins).

use crate::canonical::Label;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabEntry {
    /// Derived key, e.g. `event-kind-born_in` or `role-place_of_birth`.
    pub id: String,
    /// Display label.
    pub label: Label,
}

/// One deduplicating catalog: derived key → entry, insertion-ordered export.
#[derive(Debug, Clone, Default)]
struct Catalog {
    order: Vec<String>,
    entries: HashMap<String, VocabEntry>,
}

impl Catalog {
    fn register(&mut self, id: String, label: &str) {
        if !self.entries.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.entries.insert(
            id.clone(),
            VocabEntry { id, label: Label::new(label) },
        );
    }

    fn export(&self) -> Vec<VocabEntry> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k).cloned())
            .collect()
    }
}

/// The shared event-kind and role catalogs of one run.
#[derive(Debug, Clone, Default)]
pub struct Vocabularies {
    kinds: Catalog,
    roles: Catalog,
}

impl Vocabularies {
    /// Register an event kind; returns the derived `event-kind-<kind>` key.
    pub fn register_kind(&mut self, kind: &str) -> String {
        let id = format!("event-kind-{kind}");
        self.kinds.register(id.clone(), kind);
        id
    }

    /// Register a role; returns the derived `role-<role>` key.
    pub fn register_role(&mut self, role: &str) -> String {
        let id = format!("role-{role}");
        self.roles.register(id.clone(), role);
        id
    }

    /// Export both catalogs for the output graph.
    #[must_use]
    pub fn export(&self) -> VocabularyExport {
        VocabularyExport {
            event_kind: self.kinds.export(),
            role: self.roles.export(),
        }
    }

    /// Re-register exported entries, used when merging documents.
    pub fn absorb(&mut self, export: &VocabularyExport) {
        for entry in &export.event_kind {
            self.kinds.register(entry.id.clone(), &entry.label.default);
        }
        for entry in &export.role {
            self.roles.register(entry.id.clone(), &entry.label.default);
        }
    }
}

/// Serialized vocabulary object of the output graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyExport {
    /// Event-kind catalog.
    #[serde(rename = "event-kind", default)]
    pub event_kind: Vec<VocabEntry>,
    /// Role catalog.
    #[serde(default)]
    pub role: Vec<VocabEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut vocab = Vocabularies::default();
        assert_eq!(vocab.register_kind("born_in"), "event-kind-born_in");
        assert_eq!(vocab.register_kind("born_in"), "event-kind-born_in");
        assert_eq!(vocab.export().event_kind.len(), 1);
    }

    #[test]
    fn later_registration_overwrites_label() {
        let mut vocab = Vocabularies::default();
        vocab.roles.register("role-x".into(), "first");
        vocab.roles.register("role-x".into(), "second");
        let export = vocab.export();
        assert_eq!(export.role.len(), 1);
        assert_eq!(export.role[0].label.default, "second");
    }

    #[test]
    fn export_preserves_insertion_order() {
        let mut vocab = Vocabularies::default();
        vocab.register_role("born_in");
        vocab.register_role("place_of_birth");
        vocab.register_role("married_to");
        let roles: Vec<_> = vocab.export().role.iter().map(|e| e.id.clone()).collect();
        assert_eq!(
            roles,
            vec!["role-born_in", "role-place_of_birth", "role-married_to"]
        );
    }
}
