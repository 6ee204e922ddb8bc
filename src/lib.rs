//! # biograph
//!
//! Fusion of disagreeing text-annotation layers into one biography
//! knowledge graph.
//!
//! Several independent tools (tokenizers/taggers, NER, coreference,
//! entity linking, semantic-role labeling, temporal-expression
//! recognition) run over the same document, each with its own span
//! geometry — often over a *different tokenization* of the text. This
//! crate is the fusion-and-synthesis engine that reconciles them:
//!
//! | Stage | Module | What it does |
//! |-------|--------|--------------|
//! | Align | [`align`] | map token indices between two tokenizations |
//! | Index | [`universal`] | one merged record per character span |
//! | Unify | [`unify`] | coreference-driven entity clustering + surface-form fallback |
//! | Type  | [`canonical`] | kind assignment, labels, stable identifiers |
//! | Synthesize | [`events`] | relations and date-anchored facts → event nodes |
//! | Normalize | [`dates`], [`vocab`] | ISO date ranges, deduplicated catalogs |
//!
//! The taggers themselves, web retrieval, and HTTP plumbing are external
//! collaborators: this crate consumes their output as an
//! [`AnnotationBundle`] and produces a [`GraphDocument`].
//!
//! ## Quick Start
//!
//! ```rust
//! use biograph::{process_bundle, AnnotationBundle, RunContext};
//!
//! let json = r#"{
//!     "entities": [
//!         {"id": "e0", "category": "PER", "surfaceForm": "Albrecht Dürer",
//!          "locationStart": 0, "locationEnd": 14}
//!     ]
//! }"#;
//! let bundle: AnnotationBundle = serde_json::from_str(json).unwrap();
//! let graph = process_bundle(&bundle, &RunContext::new("duerer")).unwrap();
//! assert_eq!(graph.entities[0].id, "duerer-pr-001");
//! ```
//!
//! ## Design Notes
//!
//! - **Per-run state only**: all accumulators (span index, unified entity
//!   map, id registries, vocabularies) live inside one document's run;
//!   there are no process-wide mutable singletons.
//! - **Explicit presence**: layer fields are `Option<T>` / empty vectors,
//!   never key absence, so merge logic pattern-matches exhaustively.
//! - **Typed drop policies**: alignment gaps, unresolvable relation
//!   endpoints, unparseable dates, and duplicate identifiers are recovered
//!   locally and never escalate; only malformed layer input aborts a
//!   document.
//! - **Heuristic alignment**: the aligner trades global optimality for a
//!   monotonic single pass; its output is sparse and consumed defensively.

#![warn(missing_docs)]

pub mod align;
pub mod canonical;
pub mod cli;
pub mod dates;
mod error;
pub mod events;
pub mod graph;
pub mod layers;
pub mod pipeline;
mod span;
pub mod unify;
pub mod universal;
pub mod vocab;

pub use error::{Error, Result};
pub use span::Span;

// Re-exports of the types most callers touch.
pub use canonical::{CanonicalEntity, CanonicalSet, EntityKind, IdentifierAllocator};
pub use events::{Event, EventRelation};
pub use graph::{merge_group, GraphDocument};
pub use layers::AnnotationBundle;
pub use pipeline::{process_bundle, process_directory, process_file, BatchSummary, RunContext};
pub use unify::{UnifiedEntities, UnifiedEntity};
pub use universal::{UniversalIndex, UniversalRecord};
pub use vocab::{Vocabularies, VocabularyExport};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use biograph::prelude::*;
    //!
    //! let bundle = AnnotationBundle::default();
    //! let graph = process_bundle(&bundle, &RunContext::new("subject")).unwrap();
    //! assert!(graph.entities.is_empty());
    //! ```
    pub use crate::canonical::{CanonicalEntity, CanonicalSet, EntityKind};
    pub use crate::error::{Error, Result};
    pub use crate::events::Event;
    pub use crate::graph::GraphDocument;
    pub use crate::layers::AnnotationBundle;
    pub use crate::pipeline::{process_bundle, process_file, RunContext};
    pub use crate::span::Span;
}
