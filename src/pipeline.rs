//! Per-document pipeline orchestration and batch processing.
//!
//! One document is one strictly-ordered, single-threaded run: rebase
//! token-indexed coreference → fold the universal index → unify entities →
//! type and identify → synthesize events → assemble the graph. All mutable
//! state lives in accumulators created for the run; nothing survives it and
//! nothing is shared across documents. Documents are independent — a failed
//! document is reported by identifier and skipped, and the batch continues.

use crate::align::{align_token_sequences, rebase_mention};
use crate::canonical::assign;
use crate::events::synthesize;
use crate::graph::{merge_group, GraphDocument};
use crate::layers::AnnotationBundle;
use crate::unify::unify;
use crate::universal::UniversalIndex;
use crate::vocab::Vocabularies;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Run-scoped context: the subject namespace everything in one document's
/// graph is identified under.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Subject namespace for identifiers (typically the biography subject's
    /// last name, lowercased).
    pub subject: String,
}

impl RunContext {
    /// Create a context with an explicit subject namespace.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into() }
    }

    /// Derive the subject namespace from a bundle filename:
    /// `albrecht_duerer.nlp.json` → `duerer`.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .split('.')
            .next()
            .unwrap_or("document");
        let subject = stem.rsplit('_').next().unwrap_or(stem).to_lowercase();
        Self::new(subject)
    }
}

/// Run the whole pipeline over one annotation bundle.
pub fn process_bundle(bundle: &AnnotationBundle, ctx: &RunContext) -> Result<GraphDocument> {
    bundle.validate()?;
    let bundle = rebase_coreference(bundle);

    let index = UniversalIndex::build(&bundle);
    let unified = unify(&index, &bundle.coreference, &bundle.linked_surface_forms);
    let mut canon = assign(&unified, &ctx.subject, &bundle.coordinates);
    let mut vocab = Vocabularies::default();
    let timex = timex_value_map(&bundle);
    let events = synthesize(&index, &unified, &mut canon, &mut vocab, &ctx.subject, &timex);

    Ok(GraphDocument {
        entities: canon.into_entities(),
        events,
        vocabularies: vocab.export(),
        ..Default::default()
    })
}

/// Read, deserialize, and process one bundle file.
pub fn process_file(path: &Path) -> Result<GraphDocument> {
    let ctx = RunContext::from_path(path);
    let raw = fs::read_to_string(path)?;
    let bundle: AnnotationBundle = serde_json::from_str(&raw)
        .map_err(|e| Error::malformed_layer(format!("{}: {e}", path.display())))?;
    process_bundle(&bundle, &ctx)
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Documents processed successfully, by identifier.
    pub processed: Vec<String>,
    /// Documents skipped after a fatal per-document error, by identifier.
    pub failed: Vec<String>,
    /// Path of the merged group graph, when one was written.
    pub merged_path: Option<PathBuf>,
}

/// Process every bundle in a directory, writing one graph file per document
/// and, when `merge` is set, a merged group-level graph.
pub fn process_directory(
    dir: &Path,
    group: &str,
    out_dir: &Path,
    merge: bool,
) -> Result<BatchSummary> {
    let pattern = dir.join("*.json");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::invalid_input("non-UTF-8 directory path"))?;
    let mut summary = BatchSummary::default();
    let mut graphs: Vec<GraphDocument> = Vec::new();

    fs::create_dir_all(out_dir)?;
    let mut paths: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| Error::invalid_input(format!("bad glob pattern: {e}")))?
        .filter_map(std::result::Result::ok)
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| !n.ends_with(".graph.json"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(Error::invalid_input(format!(
            "no annotation bundles found in {}",
            dir.display()
        )));
    }

    for path in paths {
        let doc_id = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .split('.')
            .next()
            .unwrap_or("document")
            .to_string();
        match process_file(&path) {
            Ok(graph) => {
                let out_path = out_dir.join(format!("{doc_id}.graph.json"));
                fs::write(&out_path, graph.to_json()?)?;
                log::info!(
                    "{doc_id}: {} entities, {} events -> {}",
                    graph.entity_count(),
                    graph.event_count(),
                    out_path.display()
                );
                graphs.push(graph);
                summary.processed.push(doc_id);
            }
            Err(e) => {
                log::warn!("{doc_id}: skipped ({e})");
                summary.failed.push(doc_id);
            }
        }
    }

    if merge {
        let merged = merge_group(graphs, group);
        let merged_path = out_dir.join(format!("{group}.graph.json"));
        fs::write(&merged_path, merged.to_json()?)?;
        log::info!(
            "{group}: merged graph with {} entities, {} events -> {}",
            merged.entity_count(),
            merged.event_count(),
            merged_path.display()
        );
        summary.merged_path = Some(merged_path);
    }

    Ok(summary)
}

/// Rebase token-indexed coreference mentions onto reference char offsets.
///
/// Only runs when the bundle carries both the coreference tool's tokenization
/// and the reference tokenization; mentions that cannot be rebased are
/// dropped (an alignment gap, not an error).
fn rebase_coreference(bundle: &AnnotationBundle) -> AnnotationBundle {
    let mut bundle = bundle.clone();
    if bundle.coref_tokens.is_empty() || bundle.tokens.is_empty() {
        return bundle;
    }
    let reference_texts: Vec<&str> = bundle.tokens.iter().map(|t| t.text.as_str()).collect();
    let map = align_token_sequences(&bundle.coref_tokens, &reference_texts);

    for mentions in bundle.coreference.values_mut() {
        mentions.retain_mut(|mention| {
            if mention.char_span().is_some() {
                return true;
            }
            let (Some(start), Some(end)) = (mention.token_start, mention.token_end) else {
                log::debug!("coreference mention {:?} has no offsets", mention.surface_form);
                return false;
            };
            match rebase_mention(&map, &bundle.tokens, start, end) {
                Some(span) => {
                    mention.location_start = Some(span.start);
                    mention.location_end = Some(span.end);
                    true
                }
                None => {
                    log::debug!(
                        "coreference mention {:?} dropped: tokens {start}..{end} unalignable",
                        mention.surface_form
                    );
                    false
                }
            }
        });
    }
    bundle
}

/// Surface form → normalized value, for every time expression that carries
/// a value.
fn timex_value_map(bundle: &AnnotationBundle) -> HashMap<String, String> {
    bundle
        .time_expressions
        .iter()
        .filter_map(|t| {
            t.value
                .as_ref()
                .map(|v| (t.surface_form.trim().to_string(), v.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_is_derived_from_filename() {
        let ctx = RunContext::from_path(Path::new("/data/albrecht_duerer.nlp.json"));
        assert_eq!(ctx.subject, "duerer");
        let ctx = RunContext::from_path(Path::new("pfeiffer.json"));
        assert_eq!(ctx.subject, "pfeiffer");
    }

    #[test]
    fn empty_bundle_produces_empty_graph() {
        let bundle = AnnotationBundle::default();
        let graph = process_bundle(&bundle, &RunContext::new("x")).unwrap();
        assert_eq!(graph.entity_count(), 0);
        assert_eq!(graph.event_count(), 0);
    }
}
