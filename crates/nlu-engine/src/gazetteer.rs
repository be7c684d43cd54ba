//! Surface form matching for gazetteer entities.
//!
//! Every entity listed in the bundle's dataset metadata (custom entities and
//! gazetteer builtins such as `builtin/city`) contributes its surface forms,
//! plus each resolved value as a surface form of itself.  Forms are matched
//! in the normalized utterance (lower-cased words joined by single spaces)
//! with one [`AhoCorasick`] automaton, and only matches that start and end on
//! word boundaries are kept.
//!
//! Overlapping matches are all reported; choosing between them is left to
//! the slot extractor.

use std::collections::BTreeMap;
use std::ops::Range;

use aho_corasick::AhoCorasick;
use nlu_bundle::ModelBundle;

use crate::error::{NluError, Result};
use crate::tokenizer::{Token, normalize};

/// A gazetteer hit, in token coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazetteerMatch<'g> {
    /// Identifier of the entity the surface form belongs to.
    pub entity: &'g str,
    /// The value the surface form resolves to.
    pub resolved: &'g str,
    /// Matched tokens, half-open.
    pub tokens: Range<usize>,
}

struct Entry {
    entity: usize,
    resolved: String,
}

/// Compiled surface forms of every entity in a bundle.
pub struct Gazetteer {
    entities: Vec<String>,
    /// Surface form -> entries; indexes align with the automaton patterns.
    entries: Vec<Vec<Entry>>,
    automaton: Option<AhoCorasick>,
}

impl Gazetteer {
    /// Compile the gazetteer of `bundle`.
    ///
    /// Fails with [`NluError::InitFailure`] if the automaton cannot be built.
    pub fn from_bundle(bundle: &ModelBundle) -> Result<Self> {
        let mut entities = Vec::with_capacity(bundle.entities().len());
        let mut forms: BTreeMap<String, Vec<Entry>> = BTreeMap::new();

        for (index, (name, definition)) in bundle.entities().iter().enumerate() {
            entities.push(name.clone());
            let surfaces = definition
                .utterances
                .iter()
                .chain(definition.utterances.values().map(|v| (v, v)));
            for (surface, resolved) in surfaces {
                let key = normalize(surface);
                if key.is_empty() {
                    continue;
                }
                let entries = forms.entry(key).or_default();
                // First surface wins within one entity.
                if !entries.iter().any(|e| e.entity == index) {
                    entries.push(Entry {
                        entity: index,
                        resolved: resolved.clone(),
                    });
                }
            }
        }

        let (patterns, entries): (Vec<String>, Vec<Vec<Entry>>) = forms.into_iter().unzip();
        let automaton = if patterns.is_empty() {
            None
        } else {
            let ac = AhoCorasick::new(&patterns)
                .map_err(|e| NluError::init(format!("failed to build gazetteer: {e}")))?;
            Some(ac)
        };

        tracing::trace!(
            entities = entities.len(),
            surface_forms = patterns.len(),
            "gazetteer compiled"
        );

        Ok(Self {
            entities,
            entries,
            automaton,
        })
    }

    /// Number of distinct normalized surface forms.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All word-aligned matches in `tokens`, ordered by start token then by
    /// entity identifier.
    pub(crate) fn find(&self, tokens: &[Token]) -> Vec<GazetteerMatch<'_>> {
        let Some(ac) = &self.automaton else {
            return Vec::new();
        };

        // Byte offset of each token inside the joined text.
        let mut starts = Vec::with_capacity(tokens.len());
        let mut ends = Vec::with_capacity(tokens.len());
        let mut text = String::new();
        for token in tokens {
            if !text.is_empty() {
                text.push(' ');
            }
            starts.push(text.len());
            text.push_str(&token.normalized);
            ends.push(text.len());
        }

        let mut matches = Vec::new();
        for mat in ac.find_overlapping_iter(&text) {
            let (Ok(first), Ok(last)) = (
                starts.binary_search(&mat.start()),
                ends.binary_search(&mat.end()),
            ) else {
                continue;
            };
            for entry in &self.entries[mat.pattern().as_usize()] {
                matches.push(GazetteerMatch {
                    entity: &self.entities[entry.entity],
                    resolved: &entry.resolved,
                    tokens: first..last + 1,
                });
            }
        }

        matches.sort_by(|a, b| {
            a.tokens
                .start
                .cmp(&b.tokens.start)
                .then(a.tokens.end.cmp(&b.tokens.end))
                .then(a.entity.cmp(b.entity))
        });
        matches
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
