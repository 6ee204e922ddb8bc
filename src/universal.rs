//! The universal span index: one record per character span, merged from all
//! annotation layers.
//!
//! Layers are folded in a fixed order — entities → relations → semantic
//! roles → links → time expressions → coreference — because later layers
//! legitimately overwrite fields written by earlier ones (`surface_form`,
//! `cluster_id`). The fold is pure: it builds the index and nothing else.

use crate::layers::{AnnotationBundle, Proposition, RelationAnnotation};
use crate::Span;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Everything the layers collectively know about one span.
///
/// Field presence is explicit: `None` / empty means "no layer touched this",
/// never a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UniversalRecord {
    /// The span this record accumulates.
    pub span: Span,
    /// Recognized-entity id, when an entity layer seeded this span.
    pub entity_id: Option<String>,
    /// Sentence index, when known.
    pub sentence_id: Option<i64>,
    /// Canonical surface form. Last writer wins; the coreference layer
    /// refreshes it to the mention text.
    pub surface_form: String,
    /// NER category votes, one per entity layer item on this span.
    pub ner: Vec<String>,
    /// Relations touching this span. Both endpoints carry the full relation
    /// object so either side can re-derive the event.
    pub relations: Vec<RelationAnnotation>,
    /// Semantic-role propositions anchored at this span.
    pub propositions: Vec<Proposition>,
    /// Entity-linking URL, when resolved. Last writer wins.
    pub wiki_link: Option<String>,
    /// Coreference cluster id. `None` means "not yet known to be coreferent
    /// with anything"; a negative value is an explicit singleton marker.
    pub cluster_id: Option<i64>,
    /// Normalized temporal value, when a time expression covers this span.
    pub timex_value: Option<String>,
}

/// Span-keyed index over all layers of one document.
#[derive(Debug, Clone, Default)]
pub struct UniversalIndex {
    records: BTreeMap<Span, UniversalRecord>,
    span_by_entity: HashMap<String, Span>,
}

impl UniversalIndex {
    /// Fold all layers of a bundle into the index.
    #[must_use]
    pub fn build(bundle: &AnnotationBundle) -> Self {
        let mut index = Self::default();

        for ent in &bundle.entities {
            let span = ent.span();
            let record = index.records.entry(span).or_insert_with(|| UniversalRecord {
                span,
                entity_id: Some(ent.id.clone()),
                sentence_id: ent.sentence_id,
                surface_form: ent.surface_form.clone(),
                ..Default::default()
            });
            record.ner.push(ent.category.clone());
            index.span_by_entity.insert(ent.id.clone(), span);
        }

        for rel in &bundle.relations {
            let subj_span = index.span_by_entity.get(&rel.subject_id).copied();
            let obj_span = index.span_by_entity.get(&rel.object_id).copied();
            // Both endpoints must be recognized entities, and both records
            // receive the relation.
            if let (Some(subj), Some(obj)) = (subj_span, obj_span) {
                for span in [subj, obj] {
                    if let Some(record) = index.records.get_mut(&span) {
                        record.relations.push(rel.clone());
                    }
                }
            } else {
                log::debug!(
                    "relation {} dropped: endpoint not in entity layer",
                    rel.relation_id
                );
            }
        }

        for prop in &bundle.semantic_roles {
            let span = prop.span();
            let record = index.records.entry(span).or_insert_with(|| UniversalRecord {
                span,
                sentence_id: prop.sentence_id,
                surface_form: prop.predicate_surface_form.clone(),
                ..Default::default()
            });
            record.propositions.push(prop.clone());
        }

        for link in &bundle.linked_entities {
            let span = link.span();
            let record = index.records.entry(span).or_insert_with(|| UniversalRecord {
                span,
                surface_form: link.surface_form.clone().unwrap_or_default(),
                ..Default::default()
            });
            record.wiki_link = Some(link.wiki_url.clone());
        }

        for timex in &bundle.time_expressions {
            let span = timex.span();
            let record = index.records.entry(span).or_insert_with(|| UniversalRecord {
                span,
                surface_form: timex.surface_form.clone(),
                ..Default::default()
            });
            record.timex_value = timex.value.clone();
        }

        for (cluster_id, mentions) in &bundle.coreference {
            for mention in mentions {
                let Some(span) = mention.char_span() else {
                    // Not rebased into reference coordinates; unusable here.
                    log::debug!(
                        "coreference mention {:?} in cluster {} has no char span",
                        mention.surface_form,
                        cluster_id
                    );
                    continue;
                };
                let record = index.records.entry(span).or_insert_with(|| UniversalRecord {
                    span,
                    ..Default::default()
                });
                record.cluster_id = Some(*cluster_id);
                record.surface_form = mention.surface_form.clone();
            }
        }

        index
    }

    /// Look up the record for a span.
    #[must_use]
    pub fn get(&self, span: &Span) -> Option<&UniversalRecord> {
        self.records.get(span)
    }

    /// Span of a recognized entity, by its layer-local id.
    #[must_use]
    pub fn span_of(&self, entity_id: &str) -> Option<Span> {
        self.span_by_entity.get(entity_id).copied()
    }

    /// All records in document (span) order.
    pub fn records(&self) -> impl Iterator<Item = &UniversalRecord> {
        self.records.values()
    }

    /// Number of spans in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
