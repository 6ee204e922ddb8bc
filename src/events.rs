//! Event synthesis: relations and date-anchored facts become graph nodes.
//!
//! Three sources feed the event list, in a fixed order per document:
//!
//! 1. **Creation events** — every cultural-object entity yields one creation
//!    event crediting the biography's main subject as creator.
//! 2. **Relation events** — every relation attached to a canonical entity
//!    yields exactly one event (relations sit on both endpoint accumulators,
//!    so synthesis dedups by relation id). The subject role is the raw
//!    relation label; the object role is its registered inverse, or `unk`.
//! 3. **Proposition events** — a semantic-role triple with a normalizable
//!    temporal argument becomes an event when a known entity appears in its
//!    complement, or unconditionally when the triple is about the main
//!    subject (so birth/death-style facts always surface).
//!
//! A relation whose subject or object cannot be resolved to a canonical
//! entity is silently dropped: no event, no error.

use crate::canonical::{pad_id, CanonicalSet, EntityRelation, Label};
use crate::dates::normalize;
use crate::unify::UnifiedEntities;
use crate::universal::UniversalIndex;
use crate::vocab::Vocabularies;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Inverse role for each registered relation label. Labels without an
/// inverse fall back to the literal `unk`.
static INVERSE_RELATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("based_in", "location_of"),
        ("born_in", "place_of_birth"),
        ("child_of", "parent_of"),
        ("lived_in", "place_of_residence"),
        ("married_to", "married_to"),
        ("parent_of", "child_of"),
        ("sibling_of", "sibling_of"),
    ])
});

/// An event-side pointer to a participating entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRelation {
    /// Canonical entity identifier.
    pub entity: String,
    /// Role identifier (`role-...`).
    pub role: String,
}

/// A synthesized event node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier (`<subject>-<code>-ev-<counter>`).
    pub id: String,
    /// Display label.
    pub label: Label,
    /// Event kind key (`event-kind-...`).
    pub kind: String,
    /// ISO start date, when derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// ISO end date, when derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Participating entities with their roles. Self-describing: both halves
    /// of a relation are stored explicitly.
    pub relations: Vec<EventRelation>,
}

/// Synthesize all events for one document and wire up both ends of every
/// entity↔event pointer.
#[must_use]
pub fn synthesize(
    index: &UniversalIndex,
    unified: &UnifiedEntities,
    canon: &mut CanonicalSet,
    vocab: &mut Vocabularies,
    subject: &str,
    timex_values: &HashMap<String, String>,
) -> Vec<Event> {
    let mut synth = Synthesizer {
        unified,
        canon,
        vocab,
        subject,
        timex_values,
        seq: 1,
        seen_relations: HashSet::new(),
        events: Vec::new(),
    };
    synth.creation_and_relation_events();
    synth.proposition_events(index);
    synth.events
}

struct Synthesizer<'a> {
    unified: &'a UnifiedEntities,
    canon: &'a mut CanonicalSet,
    vocab: &'a mut Vocabularies,
    subject: &'a str,
    timex_values: &'a HashMap<String, String>,
    seq: u32,
    seen_relations: HashSet<String>,
    events: Vec<Event>,
}

impl Synthesizer<'_> {
    fn next_event_id(&mut self, code: &str) -> String {
        let id = format!("{}-{}-ev-{}", self.subject, code, pad_id(self.seq));
        self.seq += 1;
        id
    }

    fn point_entity_at_event(&mut self, unified_key: &str, event_id: &str, role: &str) {
        if let Some(entity) = self.canon.get_mut(unified_key) {
            entity.relations.push(EntityRelation {
                event: event_id.to_string(),
                role: role.to_string(),
            });
        }
    }

    fn creation_and_relation_events(&mut self) {
        for key in self.canon.keys() {
            self.creation_event(&key);
            self.relation_events(&key);
        }
    }

    /// A cultural object "was created"; the main subject is assumed to be
    /// the creator.
    fn creation_event(&mut self, key: &str) {
        let Some(entity) = self.canon.get(key) else { return };
        if entity.kind != crate::canonical::EntityKind::CulturalObject {
            return;
        }
        let Some(main_key) = self.canon.main_subject.clone() else { return };
        if main_key == key {
            return;
        }
        let Some(main_id) = self.canon.unified_to_id.get(&main_key).cloned() else {
            return;
        };
        let object_id = entity.id.clone();
        let label = self
            .unified
            .get(key)
            .and_then(|u| u.surface_forms.first().cloned())
            .unwrap_or_else(|| entity.label.default.clone());

        let kind_key = self.vocab.register_kind("creation");
        let subj_role = self.vocab.register_role("was_creator");
        let obj_role = self.vocab.register_role("object_created");

        let event_id = self.next_event_id("pr");
        self.point_entity_at_event(&main_key, &event_id, &subj_role);
        self.point_entity_at_event(key, &event_id, &obj_role);
        self.events.push(Event {
            id: event_id,
            label: Label::new(label),
            kind: kind_key,
            start_date: None,
            end_date: None,
            relations: vec![
                EventRelation { entity: object_id, role: obj_role },
                EventRelation { entity: main_id, role: subj_role },
            ],
        });
    }

    fn relation_events(&mut self, key: &str) {
        let Some(unified) = self.unified.get(key) else { return };
        if self.canon.get(key).is_none() {
            return;
        }
        // Both endpoints carry the relation, so clone the list up front and
        // dedup by id across the whole document.
        let relations = unified.relations.clone();
        for rel in relations {
            if !self.seen_relations.insert(rel.relation_id.clone()) {
                continue;
            }
            let resolved = self.resolve_endpoints(&rel.subject_id, &rel.object_id);
            let Some((subj_key, subj_id, obj_key, obj_id)) = resolved else {
                log::debug!(
                    "relation {} ({}) dropped: endpoint not canonical",
                    rel.relation_id,
                    rel.relation_value
                );
                continue;
            };

            let kind_key = self.vocab.register_kind(&rel.relation_value);
            let subj_role = self.vocab.register_role(&rel.relation_value);
            let inverse = INVERSE_RELATIONS
                .get(rel.relation_value.as_str())
                .copied()
                .unwrap_or("unk");
            let obj_role = self.vocab.register_role(inverse);

            let code = self
                .canon
                .get(&subj_key)
                .map_or("pr", |e| e.kind.code());
            let label = if rel.surface_form_obj.is_empty() {
                self.canon
                    .get(&obj_key)
                    .map_or_else(String::new, |e| e.label.default.clone())
            } else {
                rel.surface_form_obj.clone()
            };

            let event_id = self.next_event_id(code);
            self.point_entity_at_event(&subj_key, &event_id, &subj_role);
            self.point_entity_at_event(&obj_key, &event_id, &obj_role);
            self.events.push(Event {
                id: event_id,
                label: Label::new(label),
                kind: kind_key,
                start_date: None,
                end_date: None,
                relations: vec![
                    EventRelation { entity: obj_id, role: obj_role },
                    EventRelation { entity: subj_id, role: subj_role },
                ],
            });
        }
    }

    /// Resolve both relation endpoints to `(unified key, canonical id)`.
    fn resolve_endpoints(
        &self,
        subject_id: &str,
        object_id: &str,
    ) -> Option<(String, String, String, String)> {
        let subj_key = self.unified.resolve(subject_id)?.to_string();
        let obj_key = self.unified.resolve(object_id)?.to_string();
        let subj_id = self.canon.unified_to_id.get(&subj_key)?.clone();
        let obj_id = self.canon.unified_to_id.get(&obj_key)?.clone();
        Some((subj_key, subj_id, obj_key, obj_id))
    }

    fn proposition_events(&mut self, index: &UniversalIndex) {
        let propositions: Vec<_> = index
            .records()
            .flat_map(|r| r.propositions.iter().cloned())
            .collect();
        for prop in propositions {
            self.proposition_event(&prop);
        }
    }

    fn proposition_event(&mut self, prop: &crate::layers::Proposition) {
        let Some(temporal) = prop.arguments.iter().find(|a| is_temporal_label(&a.label))
        else {
            return;
        };
        // The recognizer's normalized value beats re-parsing the raw text.
        let date_text = self
            .timex_values
            .get(temporal.surface_form.trim())
            .cloned()
            .unwrap_or_else(|| temporal.surface_form.clone());
        let Some(range) = normalize(&date_text) else {
            log::debug!(
                "proposition {:?} dropped: unparseable date {:?}",
                prop.predicate_surface_form,
                temporal.surface_form
            );
            return;
        };

        let subject_arg = prop
            .arguments
            .iter()
            .find(|a| matches!(a.label.as_str(), "ARG0" | "A0"))
            .or_else(|| prop.arguments.iter().find(|a| !is_temporal_label(&a.label)));
        let complement = prop
            .arguments
            .iter()
            .find(|a| {
                matches!(a.label.as_str(), "ARG1" | "A1" | "ARG2" | "A2")
                    && subject_arg.map_or(true, |s| !std::ptr::eq(*a, s))
            })
            .map(|a| a.surface_form.as_str());

        let matched = self.entities_in(complement.unwrap_or(""));
        let is_main = subject_arg
            .map_or(false, |arg| self.is_main_subject(arg.surface_form.trim()));
        if matched.is_empty() && !is_main {
            return;
        }

        let subject_key = if is_main {
            self.canon.main_subject.clone()
        } else {
            subject_arg
                .and_then(|arg| self.entity_by_exact_form(arg.surface_form.trim()))
                .or_else(|| self.canon.main_subject.clone())
        };
        let Some(subject_key) = subject_key else { return };
        let Some(subject_entity_id) = self.canon.unified_to_id.get(&subject_key).cloned()
        else {
            return;
        };

        let kind = event_kind_of(prop);
        let kind_key = self.vocab.register_kind(&kind);
        let subj_role = self.vocab.register_role(&kind);
        let inverse = INVERSE_RELATIONS.get(kind.as_str()).copied().unwrap_or("unk");
        let obj_role = self.vocab.register_role(inverse);

        let code = self.canon.get(&subject_key).map_or("pr", |e| e.kind.code());
        let event_id = self.next_event_id(code);

        let mut relations = Vec::new();
        self.point_entity_at_event(&subject_key, &event_id, &subj_role);
        relations.push(EventRelation { entity: subject_entity_id.clone(), role: subj_role });
        for (obj_key, obj_id) in matched {
            if obj_id == subject_entity_id {
                continue;
            }
            self.point_entity_at_event(&obj_key, &event_id, &obj_role);
            relations.push(EventRelation { entity: obj_id, role: obj_role.clone() });
        }

        self.events.push(Event {
            id: event_id,
            label: Label::new(prop.predicate_surface_form.clone()),
            kind: kind_key,
            start_date: Some(range.start_iso()),
            end_date: range.end_iso(),
            relations,
        });
    }

    /// Canonical entities whose surface forms occur inside the text.
    fn entities_in(&self, text: &str) -> Vec<(String, String)> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut out: Vec<(String, String)> = Vec::new();
        for key in self.canon.keys() {
            let Some(unified) = self.unified.get(&key) else { continue };
            let hit = unified
                .surface_forms
                .iter()
                .any(|form| form.chars().count() > 1 && text.contains(form.as_str()));
            if hit {
                if let Some(id) = self.canon.unified_to_id.get(&key) {
                    if !out.iter().any(|(_, existing)| existing == id) {
                        out.push((key, id.clone()));
                    }
                }
            }
        }
        out
    }

    /// Canonical entity whose surface forms contain an exact match.
    fn entity_by_exact_form(&self, text: &str) -> Option<String> {
        self.canon.keys().into_iter().find(|key| {
            self.unified
                .get(key)
                .is_some_and(|u| u.surface_forms.iter().any(|f| f.trim() == text))
        })
    }

    fn is_main_subject(&self, text: &str) -> bool {
        let Some(main_key) = &self.canon.main_subject else { return false };
        self.unified
            .get(main_key)
            .is_some_and(|u| u.surface_forms.iter().any(|f| f.trim() == text))
    }
}

/// Predicate labels with temporal argument semantics.
fn is_temporal_label(label: &str) -> bool {
    let upper = label.to_uppercase();
    upper.contains("TMP") || upper == "DATE" || upper == "TIME"
}

/// Event kind derived from a proposition: the predicate sense when
/// disambiguated, else its surface form, normalized to a vocabulary-safe key.
fn event_kind_of(prop: &crate::layers::Proposition) -> String {
    let raw = prop
        .predicate_sense
        .as_deref()
        .unwrap_or(&prop.predicate_surface_form);
    let mut kind = String::with_capacity(raw.len());
    let mut pending = false;
    for ch in raw.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending && !kind.is_empty() {
                kind.push('_');
            }
            pending = false;
            kind.push(ch);
        } else {
            pending = true;
        }
    }
    if kind.is_empty() {
        "unknown".to_string()
    } else {
        kind
    }
}
