//! The output graph document and group-level merging.
//!
//! One graph object per document; batch runs over a movement or group can
//! additionally merge all per-document graphs into one group-level graph.
//! Merging renumbers every entity, event, and media identifier under the
//! group namespace and rewrites all internal cross-references through the
//! same substitution table, so entity-side event pointers and event-side
//! entity pointers stay consistent.

use crate::canonical::{pad_id, CanonicalEntity};
use crate::events::Event;
use crate::vocab::{Vocabularies, VocabularyExport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A media item attached to the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Media identifier.
    pub id: String,
    /// Any further fields the producer attached.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One document's (or one group's) complete biography graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Canonical entities.
    pub entities: Vec<CanonicalEntity>,
    /// Synthesized events.
    pub events: Vec<Event>,
    /// Media items.
    pub media: Vec<MediaItem>,
    /// Biography records.
    pub biographies: Vec<serde_json::Value>,
    /// Event-kind and role catalogs.
    pub vocabularies: VocabularyExport,
    /// Recognized-but-untyped spans. Reserved for future population;
    /// currently always empty.
    pub unmapped_entities: Vec<serde_json::Value>,
    /// Reserved; always empty.
    pub collections: serde_json::Map<String, serde_json::Value>,
}

impl GraphDocument {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Merge per-document graphs into one group-level graph.
///
/// Counter-derived identifiers are renumbered with group-wide counters;
/// slug-derived identifiers keep their slug under the group namespace, so
/// the same externally-linked entity coming from several documents collapses
/// to a single node (the first document wins, later duplicates contribute
/// only their event pointers).
#[must_use]
pub fn merge_group(docs: Vec<GraphDocument>, group: &str) -> GraphDocument {
    let mut merged = GraphDocument::default();
    let mut entity_subst: HashMap<String, String> = HashMap::new();
    let mut event_subst: HashMap<String, String> = HashMap::new();
    let mut counters: HashMap<String, u32> = HashMap::new();
    let mut entity_index: HashMap<String, usize> = HashMap::new();
    let mut vocab = Vocabularies::default();
    let mut event_seq: u32 = 1;
    let mut media_seq: u32 = 1;

    for doc in docs {
        // 1. Entities: renumber, dedup on collision, remember the mapping.
        for mut entity in doc.entities {
            let new_id = match split_id(&entity.id) {
                Some((_, code, unique)) if unique.chars().all(|c| c.is_ascii_digit()) => {
                    let counter = counters.entry(code.to_string()).or_insert(0);
                    *counter += 1;
                    format!("{group}-{code}-{}", pad_id(*counter))
                }
                Some((_, code, unique)) => format!("{group}-{code}-{unique}"),
                None => {
                    let counter = counters.entry("ent".to_string()).or_insert(0);
                    *counter += 1;
                    format!("{group}-ent-{}", pad_id(*counter))
                }
            };
            entity_subst.insert(entity.id.clone(), new_id.clone());
            if let Some(&existing) = entity_index.get(&new_id) {
                // Same slug from another document: one node, merged pointers.
                merged.entities[existing]
                    .relations
                    .append(&mut entity.relations);
                continue;
            }
            entity.id = new_id.clone();
            entity_index.insert(new_id, merged.entities.len());
            merged.entities.push(entity);
        }

        // 2. Events: renumber with a group-wide counter.
        for mut event in doc.events {
            let code = split_id(&event.id).map_or("pr", |(_, code, _)| code);
            let new_id = format!("{group}-{code}-ev-{}", pad_id(event_seq));
            event_seq += 1;
            event_subst.insert(event.id.clone(), new_id.clone());
            event.id = new_id;
            merged.events.push(event);
        }

        // 3. Media: renumber.
        for mut item in doc.media {
            let new_id = format!("{group}-media-{}", pad_id(media_seq));
            media_seq += 1;
            item.id = new_id;
            merged.media.push(item);
        }

        merged.biographies.extend(doc.biographies);
        vocab.absorb(&doc.vocabularies);
    }

    // 4. Rewrite cross-references through the substitution tables.
    for entity in &mut merged.entities {
        for relation in &mut entity.relations {
            if let Some(new_id) = event_subst.get(&relation.event) {
                relation.event = new_id.clone();
            }
        }
    }
    for event in &mut merged.events {
        for relation in &mut event.relations {
            if let Some(new_id) = entity_subst.get(&relation.entity) {
                relation.entity = new_id.clone();
            }
        }
    }

    merged.vocabularies = vocab.export();
    merged
}

/// Split an identifier into `(namespace, type code, unique part)`.
///
/// Event identifiers (`x-pr-ev-007`) report their entity type code with the
/// `ev` marker folded into the unique part.
fn split_id(id: &str) -> Option<(&str, &str, &str)> {
    let mut parts = id.splitn(3, '-');
    let namespace = parts.next()?;
    let code = parts.next()?;
    let unique = parts.next()?;
    if unique.is_empty() {
        return None;
    }
    Some((namespace, code, unique))
}
