//! Approximate alignment between two tokenizations of the same text.
//!
//! # The Tokenization Drift Problem
//!
//! Two tools rarely tokenize the same text identically:
//!
//! ```text
//! reference:  ["Albrecht", "Dürer",  "(",  "1471",  "–",  "1528",  ")"]
//! other:      ["Albrecht", "Dürer",  "(1471–1528)"]
//! ```
//!
//! A span computed in one tool's token coordinates is meaningless in the
//! other's. This module maps reference token indices to other-sequence
//! indices so token-indexed layers can be rebased onto the reference
//! tokenization's character offsets.
//!
//! The aligner is a heuristic, not a true edit-distance alignment: ties and
//! ambiguous repeats are resolved by first-match and monotonic-forward bias,
//! not by global optimality. Its output is a possibly-partial map — callers
//! must treat a missing key as "no equivalent token".

use crate::layers::TokenRecord;
use crate::Span;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::hash::Hash;

/// Forward search window for exact matches.
const WINDOW: usize = 2;

/// How many pending unmatched other-tokens are considered when recovering a
/// reference token by prefix relation.
const RECOVERY_DEPTH: usize = 5;

/// Map reference token indices to other-sequence token indices.
///
/// For each reference token, a bounded forward window of the other sequence
/// is scanned for an exact match; tokens that fail the scan are recovered,
/// where possible, by a prefix relation against the first few pending
/// unmatched other-tokens, subject to a monotonicity constraint (a recovered
/// index never precedes the last accepted one). Reference tokens beyond the
/// other sequence's length all map to its last index.
///
/// # Example
///
/// ```
/// use biograph::align::align_token_sequences;
///
/// let reference = ["Anna", "lived", "in", "Vienna", "."];
/// let other = ["Anna", "lived", "in", "Vienna", "."];
/// let map = align_token_sequences(&reference, &other);
/// assert_eq!(map.get(&3), Some(&3));
/// ```
#[must_use]
pub fn align_token_sequences<R, O>(reference: &[R], other: &[O]) -> BTreeMap<usize, usize>
where
    R: AsRef<str>,
    O: AsRef<str>,
{
    // Windowed exact-match scan. A reference token may contribute several
    // (index, miss) entries before its match; duplicates are removed below
    // in first-seen order.
    let mut matched: Vec<(usize, Option<usize>)> = Vec::new();
    let mut missed: Vec<usize> = Vec::new();
    for (i, ref_tok) in reference.iter().enumerate() {
        let hi = (i + WINDOW).min(other.len());
        for (j, oth_tok) in other.iter().enumerate().take(hi).skip(i) {
            if ref_tok.as_ref() == oth_tok.as_ref() {
                matched.push((i, Some(j)));
                break;
            }
            matched.push((i, None));
            missed.push(j);
        }
    }
    let mut matched = ordered_unique(matched);
    let mut missed = ordered_unique(missed);

    // Degenerate tail: trailing reference tokens with no window left all map
    // to the last other index.
    if reference.len() > other.len() && !other.is_empty() {
        let last = other.len() - 1;
        for i in other.len()..reference.len() {
            matched.push((i, Some(last)));
        }
    }

    // Recover misses by prefix relation, consuming the first feasible
    // candidate among the pending ones. latest_other enforces forward
    // monotonicity.
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut latest_other = 0usize;
    for (ref_ix, pair) in matched {
        match pair {
            Some(oth_ix) => {
                pairs.push((ref_ix, oth_ix));
                latest_other = oth_ix;
            }
            None => {
                let ref_txt = reference[ref_ix].as_ref();
                let candidate = missed.iter().take(RECOVERY_DEPTH).position(|&m| {
                    let m_txt = other[m].as_ref();
                    (ref_txt.starts_with(m_txt) || m_txt.starts_with(ref_txt))
                        && m >= latest_other
                });
                if let Some(pos) = candidate {
                    let m = missed.remove(pos);
                    pairs.push((ref_ix, m));
                }
            }
        }
    }

    let mut map = BTreeMap::new();
    for (ref_ix, oth_ix) in ordered_unique(pairs) {
        map.insert(ref_ix, oth_ix);
    }
    map
}

/// Rebase a token-indexed mention from a foreign tokenization onto reference
/// character offsets.
///
/// `map` is the output of [`align_token_sequences`] with the foreign
/// tokenization as reference and the reference tokenization as other;
/// `tokens` is the reference tokenization with character offsets. When only
/// one endpoint aligns, the unaligned endpoint falls back to its raw index;
/// when neither aligns, the mention is unrecoverable and `None` is returned.
#[must_use]
pub fn rebase_mention(
    map: &BTreeMap<usize, usize>,
    tokens: &[TokenRecord],
    token_start: usize,
    token_end: usize,
) -> Option<Span> {
    if token_start >= token_end {
        return None;
    }
    let mapped_start = map.get(&token_start).copied();
    let mapped_end = map.get(&token_end).copied();
    let (start, end) = match (mapped_start, mapped_end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, token_end),
        (None, Some(e)) => (token_start, e),
        (None, None) => return None,
    };
    if start >= end || end > tokens.len() {
        return None;
    }
    Some(Span::new(tokens[start].start, tokens[end - 1].end))
}

/// Remove duplicates while preserving first-seen order.
fn ordered_unique<T: Hash + Eq + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|x| seen.insert(x.clone())).collect()
}
