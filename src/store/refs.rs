//! Reference occurrences, deduplicated per symbol.

use crate::types::{Location, RefKind, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One occurrence of a symbol in source: where, and in what role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ref {
    pub location: Location,
    pub kind: RefKind,
}

impl Ref {
    pub fn new(location: Location, kind: RefKind) -> Self {
        Self { location, kind }
    }
}

/// Multimap from symbol identity to the set of locations referencing it.
///
/// Exact `(location, kind)` duplicates collapse silently; overlapping
/// analysis of shared headers produces plenty of them. References are never
/// merged, only deduplicated.
#[derive(Debug, Default)]
pub struct RefStore {
    refs: HashMap<SymbolId, Vec<Ref>>,
}

impl RefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `reference` for `id`; no-op on an identical occurrence.
    pub fn insert(&mut self, id: SymbolId, reference: Ref) {
        let entries = self.refs.entry(id).or_default();
        if !entries.contains(&reference) {
            entries.push(reference);
        }
    }

    pub fn get(&self, id: &SymbolId) -> &[Ref] {
        self.refs.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of symbols with at least one reference.
    pub fn symbol_count(&self) -> usize {
        self.refs.len()
    }

    /// Total number of stored occurrences.
    pub fn ref_count(&self) -> usize {
        self.refs.values().map(Vec::len).sum()
    }

    /// Consume the store into `(identity, occurrences)` pairs sorted by
    /// identity, each occurrence list sorted by location then kind.
    pub(crate) fn into_sorted(self) -> Vec<(SymbolId, Vec<Ref>)> {
        let mut refs: Vec<(SymbolId, Vec<Ref>)> = self.refs.into_iter().collect();
        for (_, entries) in refs.iter_mut() {
            entries.sort_unstable();
        }
        refs.sort_unstable_by_key(|(id, _)| *id);
        refs
    }
}
