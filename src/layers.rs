//! Input wire model: the per-document annotation bundle.
//!
//! Each tagger contributes one *layer* — a list of records with character
//! offsets plus layer-specific fields. Layers may be produced over different
//! tokenizations of the same text; token indices are never comparable across
//! layers without going through [`crate::align`].
//!
//! Deserialization is strict about required fields: a record missing its span
//! or category fails the whole document (the engine never fabricates spans or
//! categories). Unknown extra fields are ignored, since every tool attaches
//! its own provenance and scores.

use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A complete annotation bundle for one document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationBundle {
    /// Document text, when the producing pipeline includes it.
    #[serde(default)]
    pub text: String,
    /// Recognized-entity layer.
    pub entities: Vec<EntityAnnotation>,
    /// Pairwise relation layer.
    #[serde(default)]
    pub relations: Vec<RelationAnnotation>,
    /// Semantic-role propositions, keyed by predicate span.
    #[serde(default)]
    pub semantic_roles: Vec<Proposition>,
    /// Entity-linking layer.
    #[serde(default)]
    pub linked_entities: Vec<LinkedEntity>,
    /// Coreference clusters: cluster id → member mentions. Negative ids mark
    /// non-informative singleton entries.
    #[serde(default)]
    pub coreference: BTreeMap<i64, Vec<CorefMention>>,
    /// Temporal-expression layer.
    #[serde(default)]
    pub time_expressions: Vec<TimeExpression>,
    /// Reference tokenization with character offsets, used to rebase
    /// token-indexed layers.
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
    /// The coreference tool's own tokenization, when it differs from the
    /// reference one.
    #[serde(default)]
    pub coref_tokens: Vec<String>,
    /// Externally resolved encyclopedia links, surface form → URL.
    #[serde(default)]
    pub linked_surface_forms: HashMap<String, String>,
    /// Known geocoordinates, encyclopedia URL → `[lon, lat]`.
    #[serde(default)]
    pub coordinates: HashMap<String, [f64; 2]>,
}

impl AnnotationBundle {
    /// Check structural invariants the type system cannot express.
    ///
    /// Spans must be non-inverted and categories non-empty; a violation is
    /// fatal for the document.
    pub fn validate(&self) -> Result<()> {
        for ent in &self.entities {
            if ent.location_end < ent.location_start {
                return Err(Error::malformed_layer(format!(
                    "entity {} has inverted span {}..{}",
                    ent.id, ent.location_start, ent.location_end
                )));
            }
            if ent.category.is_empty() {
                return Err(Error::malformed_layer(format!(
                    "entity {} has an empty category",
                    ent.id
                )));
            }
        }
        for rel in &self.relations {
            if rel.relation_value.is_empty() {
                return Err(Error::malformed_layer(format!(
                    "relation {} has an empty relation value",
                    rel.relation_id
                )));
            }
        }
        Ok(())
    }
}

/// One recognized entity mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAnnotation {
    /// Layer-local entity id.
    #[serde(alias = "ID")]
    pub id: String,
    /// NER category (PER, LOC, ORG, WORK_OF_ART, ...).
    pub category: String,
    /// Mention text.
    pub surface_form: String,
    /// Character offset (start, inclusive).
    pub location_start: usize,
    /// Character offset (end, exclusive).
    pub location_end: usize,
    /// Sentence index, when the tool reports one.
    #[serde(default, alias = "sentenceID")]
    pub sentence_id: Option<i64>,
    /// Producing tool, for provenance.
    #[serde(default)]
    pub method: Option<String>,
}

impl EntityAnnotation {
    /// Character span of this mention.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.location_start, self.location_end)
    }
}

/// One pairwise relation between two recognized entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAnnotation {
    /// Layer-local relation id.
    #[serde(alias = "relationID")]
    pub relation_id: String,
    /// Subject entity id (layer-local).
    #[serde(alias = "subjectID")]
    pub subject_id: String,
    /// Object entity id (layer-local).
    #[serde(alias = "objectID")]
    pub object_id: String,
    /// Relation label (e.g. `born_in`).
    pub relation_value: String,
    /// Subject mention text.
    #[serde(default)]
    pub surface_form_subj: String,
    /// Object mention text.
    #[serde(default)]
    pub surface_form_obj: String,
    /// Sentence index, when the tool reports one.
    #[serde(default, alias = "sentenceID")]
    pub sentence_id: Option<i64>,
    /// Producing tool, for provenance.
    #[serde(default)]
    pub method: Option<String>,
}

/// One semantic-role proposition, anchored at its predicate span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposition {
    /// Predicate mention text.
    pub predicate_surface_form: String,
    /// Predicate sense, when disambiguated.
    #[serde(default)]
    pub predicate_sense: Option<String>,
    /// Character offset of the predicate (start, inclusive).
    pub location_start: usize,
    /// Character offset of the predicate (end, exclusive).
    pub location_end: usize,
    /// Sentence index, when the tool reports one.
    #[serde(default, alias = "sentenceID")]
    pub sentence_id: Option<i64>,
    /// Labeled arguments of the predicate.
    #[serde(default)]
    pub arguments: Vec<PropositionArgument>,
    /// Producing tool, for provenance.
    #[serde(default)]
    pub method: Option<String>,
}

impl Proposition {
    /// Character span of the predicate.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.location_start, self.location_end)
    }
}

/// One labeled argument of a proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropositionArgument {
    /// Argument text.
    pub surface_form: String,
    /// Role label (ARG0, ARG1, ARGM-TMP, ...).
    pub label: String,
}

/// One entity-linking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedEntity {
    /// Recognized-entity id this link resolves, when the linker aligned one.
    #[serde(default, alias = "entityID")]
    pub entity_id: Option<String>,
    /// Resolved encyclopedia URL.
    #[serde(alias = "wikiURL")]
    pub wiki_url: String,
    /// Character offset (start, inclusive).
    pub location_start: usize,
    /// Character offset (end, exclusive).
    pub location_end: usize,
    /// Mention text.
    #[serde(default)]
    pub surface_form: Option<String>,
    /// Producing tool, for provenance.
    #[serde(default)]
    pub method: Option<String>,
}

impl LinkedEntity {
    /// Character span of this link.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.location_start, self.location_end)
    }
}

/// One coreference mention.
///
/// Mentions either carry character offsets directly or, when the coreference
/// tool ran over its own tokenization, token offsets that must be rebased
/// through the aligner before the mention is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorefMention {
    /// Character offset (start, inclusive), when already in reference
    /// coordinates.
    #[serde(default)]
    pub location_start: Option<usize>,
    /// Character offset (end, exclusive), when already in reference
    /// coordinates.
    #[serde(default)]
    pub location_end: Option<usize>,
    /// Token offset (start, inclusive) in the coreference tokenization.
    #[serde(default)]
    pub token_start: Option<usize>,
    /// Token offset (end, exclusive) in the coreference tokenization.
    #[serde(default)]
    pub token_end: Option<usize>,
    /// Mention text.
    pub surface_form: String,
    /// Producing tool, for provenance.
    #[serde(default)]
    pub method: Option<String>,
}

impl CorefMention {
    /// Character span, if the mention is in reference coordinates.
    #[must_use]
    pub fn char_span(&self) -> Option<Span> {
        Some(Span::new(self.location_start?, self.location_end?))
    }
}

/// One temporal expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeExpression {
    /// Expression text.
    pub surface_form: String,
    /// Expression category (DATE, TIME, DURATION, ...).
    #[serde(default)]
    pub category: Option<String>,
    /// Normalized value, when the recognizer produced one (e.g. `1471-05-21`).
    #[serde(default)]
    pub value: Option<String>,
    /// Character offset (start, inclusive).
    pub location_start: usize,
    /// Character offset (end, exclusive).
    pub location_end: usize,
    /// Producing tool, for provenance.
    #[serde(default)]
    pub method: Option<String>,
}

impl TimeExpression {
    /// Character span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.location_start, self.location_end)
    }
}

/// One token of the reference tokenization, with character offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token text.
    pub text: String,
    /// Character offset (start, inclusive).
    pub start: usize,
    /// Character offset (end, exclusive).
    pub end: usize,
}
