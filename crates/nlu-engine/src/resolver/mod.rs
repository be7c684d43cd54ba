//! Builtin entity resolution.
//!
//! Grammar builtins (dates, amounts, numbers, ...) are not listed in the
//! bundle; a [`BuiltinEntityResolver`] finds and resolves them in the raw
//! utterance.  The engine ships [`RuleResolver`], and callers can plug their
//! own implementation through
//! [`NluEngine::create_with_resolver`](crate::NluEngine::create_with_resolver).
//!
//! Resolvers return values in the tagged JSON form of
//! [`SlotValue`](nlu_ontology::SlotValue) so that an implementation built
//! against a different value set is caught at decode time rather than at
//! compile time.

mod rules;
mod time;

use std::ops::Range;

use nlu_ontology::BuiltinEntityKind;

pub use rules::RuleResolver;

/// What to look for in one utterance.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub text: &'a str,
    /// Kinds the caller can use.  Resolvers may skip everything else.
    pub kinds: &'a [BuiltinEntityKind],
    /// Upper bound on alternatives per entity.  `0` means none are needed.
    pub max_alternatives: usize,
}

/// One resolved builtin mention.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub entity: BuiltinEntityKind,
    /// Byte range into the request text.
    pub range: Range<usize>,
    /// Tagged slot value.
    pub value: serde_json::Value,
    /// Other readings, most plausible first.
    pub alternatives: Vec<serde_json::Value>,
    pub confidence: f32,
}

/// Finds builtin entities in text.
///
/// Implementations are shared between concurrent inference calls and must
/// not block on I/O.
pub trait BuiltinEntityResolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Vec<ResolvedEntity>;
}
