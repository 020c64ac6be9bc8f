//! Deduplicated symbol records, merged as observations arrive.

use crate::symbol::{Symbol, merge};
use crate::types::SymbolId;
use indexmap::IndexMap;
use indexmap::map::Entry;

/// Mapping from symbol identity to its canonical record.
///
/// Holds at most one record per identity. Iteration order is first-seen
/// order, which is exactly the order the merge tie-breaks are defined
/// against; records are only ever merged, never removed, until the store is
/// frozen into a snapshot.
#[derive(Debug, Default)]
pub struct SymbolStore {
    symbols: IndexMap<SymbolId, Symbol>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `observation` verbatim on first sight of its identity,
    /// otherwise replace the existing record with the merge of the two.
    pub fn insert(&mut self, observation: Symbol) {
        match self.symbols.entry(observation.id) {
            Entry::Occupied(mut entry) => {
                let merged = merge(entry.get(), &observation);
                entry.insert(merged);
            }
            Entry::Vacant(entry) => {
                entry.insert(observation);
            }
        }
    }

    pub fn get(&self, id: &SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.symbols.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Consume the store into records sorted by identity, the canonical
    /// order the snapshot serializes in.
    pub(crate) fn into_sorted(self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.symbols.into_values().collect();
        symbols.sort_unstable_by_key(|symbol| symbol.id);
        symbols
    }
}
