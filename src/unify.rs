//! Entity unification: from span records to real-world referents.
//!
//! Two passes over the universal index:
//!
//! 1. **Coreference-driven** — every cluster mention that lands on a
//!    recognized-entity record is merged into a cluster-derived accumulator
//!    (`ent_<cluster_id + 1>`). Mentions explicitly marked as
//!    non-informative singletons (negative cluster id) get a fresh
//!    singleton key instead.
//! 2. **Surface-form fallback** — every recognized-entity record the first
//!    pass did not touch is either fused into an existing accumulator by
//!    exact surface-form match, or becomes a new singleton.
//!
//! Together the passes guarantee that every recognized-entity record ends up
//! in exactly one unified entity. Merging is append-iff-absent on every list
//! field, so re-merging the same record is a no-op.
//!
//! Spans with no recognized-entity id (dates, bare predicates, unresolved
//! pronouns) are never unified — they are only consumed later as context for
//! event synthesis.

use crate::layers::{CorefMention, RelationAnnotation};
use crate::universal::{UniversalIndex, UniversalRecord};
use crate::Span;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A cluster of mentions believed to denote one real-world referent.
///
/// Lifecycle: created once, never deleted, only grows by accumulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedEntity {
    /// Recognized-entity ids of all member mentions.
    pub entity_ids: Vec<String>,
    /// Spans of all member mentions.
    pub spans: Vec<Span>,
    /// All distinct surface forms seen.
    pub surface_forms: Vec<String>,
    /// All distinct NER category votes.
    pub ner: Vec<String>,
    /// All relations touching any member span, deduplicated by relation id.
    pub relations: Vec<RelationAnnotation>,
    /// All distinct entity-link URLs.
    pub wiki_links: Vec<String>,
}

impl UnifiedEntity {
    /// Merge a universal record into this accumulator.
    ///
    /// Every list field appends iff the value is not already present, which
    /// makes re-merging idempotent.
    fn absorb(&mut self, record: &UniversalRecord) {
        if let Some(id) = &record.entity_id {
            if !self.entity_ids.contains(id) {
                self.entity_ids.push(id.clone());
            }
        }
        if !self.spans.contains(&record.span) {
            self.spans.push(record.span);
        }
        if !record.surface_form.is_empty() && !self.surface_forms.contains(&record.surface_form) {
            self.surface_forms.push(record.surface_form.clone());
        }
        for vote in &record.ner {
            if !self.ner.contains(vote) {
                self.ner.push(vote.clone());
            }
        }
        for rel in &record.relations {
            if !self.relations.iter().any(|r| r.relation_id == rel.relation_id) {
                self.relations.push(rel.clone());
            }
        }
        if let Some(link) = &record.wiki_link {
            self.add_wiki_link(link);
        }
    }

    /// Append an entity-link URL if not already present.
    fn add_wiki_link(&mut self, link: &str) {
        if !self.wiki_links.iter().any(|l| l == link) {
            self.wiki_links.push(link.to_string());
        }
    }
}

/// Insertion-ordered map of unified entities plus the mention-to-entity
/// resolution table.
#[derive(Debug, Clone, Default)]
pub struct UnifiedEntities {
    order: Vec<String>,
    entities: HashMap<String, UnifiedEntity>,
    /// Recognized-entity id → unified key, for every mention that was
    /// unified.
    pub entity_to_unified: HashMap<String, String>,
}

impl UnifiedEntities {
    /// Iterate `(key, entity)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnifiedEntity)> {
        self.order
            .iter()
            .map(|k| (k.as_str(), &self.entities[k]))
    }

    /// Look up a unified entity by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&UnifiedEntity> {
        self.entities.get(key)
    }

    /// Unified entity a recognized-entity id was resolved to, if any.
    #[must_use]
    pub fn resolve(&self, entity_id: &str) -> Option<&str> {
        self.entity_to_unified.get(entity_id).map(String::as_str)
    }

    /// Number of unified entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if there are no unified entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn entry(&mut self, key: &str) -> &mut UnifiedEntity {
        if !self.entities.contains_key(key) {
            self.order.push(key.to_string());
            self.entities.insert(key.to_string(), UnifiedEntity::default());
        }
        self.entities.get_mut(key).expect("just inserted")
    }
}

/// Run both unification passes.
///
/// `external_links` maps surface forms to externally resolved encyclopedia
/// URLs; they are attached during the fallback pass. The fallback pass runs
/// even when `coreference` is empty, in which case every recognized mention
/// seeds its own singleton and later mentions fuse by surface form.
#[must_use]
pub fn unify(
    index: &UniversalIndex,
    coreference: &BTreeMap<i64, Vec<CorefMention>>,
    external_links: &HashMap<String, String>,
) -> UnifiedEntities {
    let mut out = UnifiedEntities::default();
    let mut clustered: HashSet<String> = HashSet::new();
    let mut surface_to_key: HashMap<String, String> = HashMap::new();
    // Singleton keys start after the cluster-derived key range.
    let mut singleton_seq = coreference.len() as i64 + 1;

    // Pass 1: coreference-driven. The authoritative cluster id is the one
    // the index recorded for the span, so only the mention lists are walked.
    for mentions in coreference.values() {
        for mention in mentions {
            let Some(span) = mention.char_span() else { continue };
            let Some(record) = index.get(&span) else { continue };
            let Some(entity_id) = record.entity_id.clone() else {
                // A cluster mention the recognizers never typed; nothing to
                // unify from coreference text alone.
                continue;
            };
            let key = match record.cluster_id {
                Some(id) if id >= 0 => format!("ent_{}", id + 1),
                _ => {
                    let key = format!("ent_{singleton_seq}");
                    singleton_seq += 1;
                    key
                }
            };
            out.entry(&key).absorb(record);
            out.entity_to_unified.insert(entity_id.clone(), key.clone());
            clustered.insert(entity_id);
            surface_to_key.insert(record.surface_form.clone(), key);
        }
    }

    // Pass 2: surface-form fallback for everything coreference missed.
    for record in index.records() {
        let Some(entity_id) = record.entity_id.clone() else { continue };
        if clustered.contains(&entity_id) {
            continue;
        }
        let key = match surface_to_key.get(&record.surface_form) {
            Some(existing) => existing.clone(),
            None => {
                let key = format!("ent_{singleton_seq}");
                singleton_seq += 1;
                surface_to_key.insert(record.surface_form.clone(), key.clone());
                key
            }
        };
        let entity = out.entry(&key);
        entity.absorb(record);
        if let Some(link) = external_links.get(&record.surface_form) {
            entity.add_wiki_link(link);
        }
        out.entity_to_unified.insert(entity_id, key);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{AnnotationBundle, EntityAnnotation};

    fn entity(id: &str, category: &str, form: &str, start: usize, end: usize) -> EntityAnnotation {
        EntityAnnotation {
            id: id.into(),
            category: category.into(),
            surface_form: form.into(),
            location_start: start,
            location_end: end,
            sentence_id: None,
            method: None,
        }
    }

    fn mention(form: &str, start: usize, end: usize) -> CorefMention {
        CorefMention {
            location_start: Some(start),
            location_end: Some(end),
            token_start: None,
            token_end: None,
            surface_form: form.into(),
            method: None,
        }
    }

    fn no_links() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn without_coreference_every_mention_is_a_singleton() {
        let bundle = AnnotationBundle {
            entities: vec![
                entity("e0", "PER", "Dürer", 0, 5),
                entity("e1", "LOC", "Vienna", 10, 16),
            ],
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let unified = unify(&index, &BTreeMap::new(), &no_links());
        assert_eq!(unified.len(), 2);
        // Singleton numbering starts at 1 when there are no clusters.
        assert!(unified.get("ent_1").is_some());
        assert!(unified.get("ent_2").is_some());
    }

    #[test]
    fn identical_surface_forms_fuse_without_coreference() {
        let bundle = AnnotationBundle {
            entities: vec![
                entity("e0", "LOC", "Vienna", 10, 16),
                entity("e1", "LOC", "Vienna", 40, 46),
            ],
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let unified = unify(&index, &BTreeMap::new(), &no_links());
        assert_eq!(unified.len(), 1);
        let ent = unified.get("ent_1").unwrap();
        assert_eq!(ent.entity_ids, vec!["e0", "e1"]);
        assert_eq!(ent.spans.len(), 2);
    }

    #[test]
    fn cluster_members_share_one_entity() {
        let mut coreference = BTreeMap::new();
        coreference.insert(
            0,
            vec![mention("Dürer", 0, 5), mention("the painter", 30, 41)],
        );
        let bundle = AnnotationBundle {
            entities: vec![
                entity("e0", "PER", "Dürer", 0, 5),
                entity("e1", "PER", "the painter", 30, 41),
            ],
            coreference: coreference.clone(),
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let unified = unify(&index, &coreference, &no_links());
        assert_eq!(unified.len(), 1);
        let ent = unified.get("ent_1").unwrap();
        assert_eq!(ent.entity_ids.len(), 2);
        assert_eq!(unified.resolve("e0"), Some("ent_1"));
        assert_eq!(unified.resolve("e1"), Some("ent_1"));
    }

    #[test]
    fn untyped_cluster_mentions_are_skipped() {
        let mut coreference = BTreeMap::new();
        // "He" was never recognized as an entity; only the name was.
        coreference.insert(2, vec![mention("Dürer", 0, 5), mention("He", 50, 52)]);
        let bundle = AnnotationBundle {
            entities: vec![entity("e0", "PER", "Dürer", 0, 5)],
            coreference: coreference.clone(),
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let unified = unify(&index, &coreference, &no_links());
        assert_eq!(unified.len(), 1);
        let ent = unified.get("ent_3").unwrap();
        assert_eq!(ent.entity_ids, vec!["e0"]);
    }

    #[test]
    fn negative_cluster_id_yields_fresh_singleton() {
        let mut coreference = BTreeMap::new();
        coreference.insert(-1, vec![mention("Dürer", 0, 5)]);
        let bundle = AnnotationBundle {
            entities: vec![entity("e0", "PER", "Dürer", 0, 5)],
            coreference: coreference.clone(),
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let unified = unify(&index, &coreference, &no_links());
        assert_eq!(unified.len(), 1);
        // One cluster in the layer, so singleton numbering starts at 2.
        assert!(unified.get("ent_2").is_some());
    }

    #[test]
    fn coverage_every_recognized_record_is_unified() {
        let mut coreference = BTreeMap::new();
        coreference.insert(0, vec![mention("Dürer", 0, 5)]);
        let bundle = AnnotationBundle {
            entities: vec![
                entity("e0", "PER", "Dürer", 0, 5),
                entity("e1", "LOC", "Nuremberg", 20, 29),
                entity("e2", "ORG", "the guild", 44, 53),
                entity("e3", "LOC", "Nuremberg", 70, 79),
            ],
            coreference: coreference.clone(),
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let unified = unify(&index, &coreference, &no_links());
        for record in index.records() {
            let id = record.entity_id.as_ref().unwrap();
            let key = unified.resolve(id).expect("recognized record not unified");
            assert!(unified.get(key).unwrap().entity_ids.contains(id));
        }
        // The two Nuremberg mentions fused by surface form.
        assert_eq!(unified.len(), 3);
    }

    #[test]
    fn remerge_is_idempotent() {
        let mut coreference = BTreeMap::new();
        coreference.insert(
            0,
            vec![mention("Dürer", 0, 5), mention("Dürer", 0, 5)],
        );
        let bundle = AnnotationBundle {
            entities: vec![entity("e0", "PER", "Dürer", 0, 5)],
            coreference: coreference.clone(),
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let once = unify(&index, &coreference, &no_links());
        let twice = unify(&index, &coreference, &no_links());
        let a = once.get("ent_1").unwrap();
        let b = twice.get("ent_1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.entity_ids.len(), 1);
        assert_eq!(a.spans.len(), 1);
    }

    #[test]
    fn external_links_attach_by_surface_form() {
        let bundle = AnnotationBundle {
            entities: vec![entity("e0", "LOC", "Nuremberg", 20, 29)],
            ..Default::default()
        };
        let index = UniversalIndex::build(&bundle);
        let mut links = HashMap::new();
        links.insert(
            "Nuremberg".to_string(),
            "https://en.wikipedia.org/wiki/Nuremberg".to_string(),
        );
        let unified = unify(&index, &BTreeMap::new(), &links);
        let ent = unified.get("ent_1").unwrap();
        assert_eq!(
            ent.wiki_links,
            vec!["https://en.wikipedia.org/wiki/Nuremberg"]
        );
    }
}
