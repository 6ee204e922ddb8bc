//! Canonical entities: typed, identifier-bearing graph nodes.
//!
//! A unified entity is projected to at most one canonical entity. The
//! majority NER vote decides the kind through a fixed category table;
//! anything outside the table produces no canonical entity and is excluded
//! from the graph. Identifier policy lives in [`IdentifierAllocator`]:
//! slug-if-available, else a zero-padded counter.

use crate::unify::{UnifiedEntities, UnifiedEntity};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

// =============================================================================
// Entity Kinds
// =============================================================================

/// Canonical entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// An individual person.
    Person,
    /// A place: location, geo-political entity, or facility.
    Place,
    /// An organization or other formal group.
    Group,
    /// A cultural object (artwork, book, composition).
    CulturalObject,
}

impl EntityKind {
    /// Canonical label string.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Place => "place",
            EntityKind::Group => "group",
            EntityKind::CulturalObject => "cultural-object",
        }
    }

    /// Short type code used inside identifiers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            EntityKind::Person => "pr",
            EntityKind::Place => "pl",
            EntityKind::Group => "gr",
            EntityKind::CulturalObject => "ob",
        }
    }

    /// Parse a canonical label string.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "person" => Some(EntityKind::Person),
            "place" => Some(EntityKind::Place),
            "group" => Some(EntityKind::Group),
            "cultural-object" => Some(EntityKind::CulturalObject),
            _ => None,
        }
    }

    /// Map a raw NER category into a kind.
    ///
    /// Categories outside this table (DATE, NORP, MISC, ...) produce no
    /// canonical entity.
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        match category {
            "PER" | "PERSON" => Some(EntityKind::Person),
            "LOC" | "GPE" | "FAC" => Some(EntityKind::Place),
            "ORG" => Some(EntityKind::Group),
            "WORK_OF_ART" => Some(EntityKind::CulturalObject),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl Serialize for EntityKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        EntityKind::from_label(&label)
            .ok_or_else(|| D::Error::custom(format!("unknown entity kind: {label:?}")))
    }
}

// =============================================================================
// Output record primitives
// =============================================================================

/// A localizable display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Default-language label text.
    pub default: String,
}

impl Label {
    /// Create a label.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { default: text.into() }
    }
}

/// An external identifier link (encyclopedia page, authority file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedId {
    /// Deterministic identifier derived from the URL.
    pub id: String,
    /// The resolved URL.
    pub url: String,
}

/// An entity-side pointer into an event, with the entity's role in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelation {
    /// Event identifier.
    pub event: String,
    /// Role identifier (`role-...`).
    pub role: String,
}

/// Point geometry for places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// GeoJSON geometry type; always `"Point"` here.
    #[serde(rename = "type")]
    pub geometry_type: String,
    /// `[lon, lat]`, when known.
    pub coordinates: Option<[f64; 2]>,
}

impl Geometry {
    /// A point with unknown coordinates.
    #[must_use]
    pub fn unknown() -> Self {
        Self { geometry_type: "Point".into(), coordinates: None }
    }

    /// A point at the given `[lon, lat]`.
    #[must_use]
    pub fn point(coordinates: [f64; 2]) -> Self {
        Self { geometry_type: "Point".into(), coordinates: Some(coordinates) }
    }
}

/// Source citation for entities backed by an external article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Citation text.
    pub citation: String,
}

/// The typed, identifier-bearing projection of one unified entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEntity {
    /// Stable identifier (`<subject>-<code>-<slug-or-counter>`).
    pub id: String,
    /// Display label: the longest observed surface form.
    pub label: Label,
    /// Entity kind.
    pub kind: EntityKind,
    /// External identifier links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_ids: Vec<LinkedId>,
    /// Media references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
    /// Append-only pointers into events this entity participates in.
    #[serde(default)]
    pub relations: Vec<EntityRelation>,
    /// Geocoordinates; only places carry geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Source citation, when the entity is backed by an external article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Citation>,
}

// =============================================================================
// Identifier allocation
// =============================================================================

/// Identifier policy for one type code under one subject namespace:
/// slug-if-available, else the next zero-padded counter.
#[derive(Debug, Clone)]
pub struct IdentifierAllocator {
    subject: String,
    code: &'static str,
    next: u32,
}

impl IdentifierAllocator {
    /// Create an allocator for a subject namespace and type code.
    #[must_use]
    pub fn new(subject: impl Into<String>, code: &'static str) -> Self {
        Self { subject: subject.into(), code, next: 1 }
    }

    /// Allocate the next identifier.
    ///
    /// A non-empty slug hint produces `<subject>-<code>-<slug>` without
    /// consuming a counter value, so slug-derived identifiers are stable
    /// across runs.
    pub fn allocate(&mut self, slug_hint: Option<&str>) -> String {
        match slug_hint {
            Some(slug) if !slug.is_empty() => {
                format!("{}-{}-{}", self.subject, self.code, slug)
            }
            _ => {
                let id = format!("{}-{}-{}", self.subject, self.code, pad_id(self.next));
                self.next += 1;
                id
            }
        }
    }
}

/// Zero-pad a counter to three digits; larger values print literally.
#[must_use]
pub fn pad_id(n: u32) -> String {
    format!("{n:03}")
}

/// Derive a deterministic slug from an encyclopedia URL.
///
/// The last path segment is lowercased and every non-alphanumeric run
/// collapses to a single dash, so percent-escapes and underscores cannot
/// leak into identifiers.
#[must_use]
pub fn slug_from_url(url: &str) -> Option<String> {
    let tail = url.trim_end_matches('/').rsplit('/').next()?;
    let mut slug = String::with_capacity(tail.len());
    let mut pending_dash = false;
    for ch in tail.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

// =============================================================================
// Typing & projection
// =============================================================================

/// Most frequent vote, ties broken by first-seen order.
#[must_use]
pub fn majority_vote(votes: &[String]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for vote in votes {
        let count = counts[vote.as_str()];
        // Strictly-greater keeps the first-seen winner on ties.
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((vote.as_str(), count));
        }
    }
    best.map(|(vote, _)| vote)
}

/// Longest surface form; first-seen wins length ties.
#[must_use]
pub fn canonical_label(surface_forms: &[String]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for form in surface_forms {
        let len = form.chars().count();
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((form.as_str(), len));
        }
    }
    best.map(|(form, _)| form)
}

/// Most frequent entity-link URL, ties broken by first-seen order.
fn preferred_link(links: &[String]) -> Option<&str> {
    majority_vote(links)
}

/// The canonical entities of one document, in creation order, with the
/// resolution tables the event synthesizer needs.
#[derive(Debug, Clone, Default)]
pub struct CanonicalSet {
    order: Vec<String>,
    by_key: HashMap<String, CanonicalEntity>,
    /// Unified key → canonical id, for every typed entity.
    pub unified_to_id: HashMap<String, String>,
    /// Unified key of the biography's main subject, once a person was seen.
    pub main_subject: Option<String>,
}

impl CanonicalSet {
    /// Iterate `(unified key, entity)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CanonicalEntity)> {
        self.order.iter().map(|k| (k.as_str(), &self.by_key[k]))
    }

    /// Look up by unified key.
    #[must_use]
    pub fn get(&self, unified_key: &str) -> Option<&CanonicalEntity> {
        self.by_key.get(unified_key)
    }

    /// Mutable lookup by unified key.
    pub fn get_mut(&mut self, unified_key: &str) -> Option<&mut CanonicalEntity> {
        self.by_key.get_mut(unified_key)
    }

    /// Number of canonical entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if there are no canonical entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Unified keys in creation order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Drain the entities in creation order for output assembly.
    #[must_use]
    pub fn into_entities(mut self) -> Vec<CanonicalEntity> {
        self.order
            .iter()
            .filter_map(|k| self.by_key.remove(k))
            .collect()
    }
}

/// Project unified entities to canonical entities.
///
/// At most one canonical entity is created per unified entity; unified
/// entities whose majority vote falls outside the category table are
/// dropped from the graph (they remain referenceable internally during
/// synthesis through the unified tables). A later entity that would repeat
/// an already-assigned identifier or label is dropped — first write wins.
#[must_use]
pub fn assign(
    unified: &UnifiedEntities,
    subject: &str,
    coordinates: &HashMap<String, [f64; 2]>,
) -> CanonicalSet {
    let mut set = CanonicalSet::default();
    let mut allocators: HashMap<&'static str, IdentifierAllocator> = HashMap::new();
    for kind in [
        EntityKind::Person,
        EntityKind::Place,
        EntityKind::Group,
        EntityKind::CulturalObject,
    ] {
        allocators.insert(kind.code(), IdentifierAllocator::new(subject, kind.code()));
    }
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_labels: HashSet<String> = HashSet::new();

    for (key, entity) in unified.iter() {
        let Some(canonical) = project(
            entity,
            &mut allocators,
            coordinates,
            set.main_subject.is_none(),
        ) else {
            continue;
        };
        if seen_ids.contains(&canonical.id) || seen_labels.contains(&canonical.label.default) {
            log::debug!(
                "dropping duplicate canonical entity {} ({})",
                canonical.id,
                canonical.label.default
            );
            continue;
        }
        if canonical.kind == EntityKind::Person && set.main_subject.is_none() {
            set.main_subject = Some(key.to_string());
        }
        seen_ids.insert(canonical.id.clone());
        seen_labels.insert(canonical.label.default.clone());
        set.unified_to_id.insert(key.to_string(), canonical.id.clone());
        set.order.push(key.to_string());
        set.by_key.insert(key.to_string(), canonical);
    }

    set
}

fn project(
    entity: &UnifiedEntity,
    allocators: &mut HashMap<&'static str, IdentifierAllocator>,
    coordinates: &HashMap<String, [f64; 2]>,
    main_subject_open: bool,
) -> Option<CanonicalEntity> {
    let category = majority_vote(&entity.ner)?;
    let kind = EntityKind::from_category(category)?;
    let label = canonical_label(&entity.surface_forms)?.to_string();

    let wiki_link = preferred_link(&entity.wiki_links).map(str::to_string);
    let slug = wiki_link.as_deref().and_then(slug_from_url);

    let allocator = allocators.get_mut(kind.code()).expect("all codes preregistered");
    // The first person-typed entity is the biography's main subject; its
    // identifier is the fixed pr-001, never a slug.
    let id = if kind == EntityKind::Person && main_subject_open {
        allocator.allocate(None)
    } else {
        allocator.allocate(slug.as_deref())
    };

    let linked_ids = match (&wiki_link, &slug) {
        (Some(url), Some(slug)) => vec![LinkedId { id: slug.clone(), url: url.clone() }],
        _ => Vec::new(),
    };
    let geometry = (kind == EntityKind::Place).then(|| {
        wiki_link
            .as_deref()
            .and_then(|url| coordinates.get(url))
            .map_or_else(Geometry::unknown, |&coords| Geometry::point(coords))
    });
    let source = matches!(kind, EntityKind::Group | EntityKind::CulturalObject)
        .then(|| Citation { citation: "Wikipedia".into() });

    Some(CanonicalEntity {
        id,
        label: Label::new(label),
        kind,
        linked_ids,
        media: Vec::new(),
        relations: Vec::new(),
        geometry,
        source,
    })
}
