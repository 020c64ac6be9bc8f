//! Concurrent intake and the freeze into an immutable snapshot.
//!
//! Many workers analyze compilation units in parallel and hand their
//! observation batches to one [`Aggregator`]. A single mutex covers all
//! three stores: one batch always lands fully before the next is observed,
//! in arbitrary but linear order. Workers do no I/O under the lock; all
//! reading and parsing happens before intake is called.
//!
//! [`Aggregator::freeze`] consumes the aggregator by value and returns the
//! [`Snapshot`], so intake-after-freeze and double-freeze do not compile
//! instead of failing at run time.

use crate::ingest::Shard;
use crate::output::OutputFormat;
use crate::relation::Relation;
use crate::store::{Ref, RefStore, RelationStore, SymbolStore};
use crate::symbol::Symbol;
use crate::types::SymbolId;
use parking_lot::Mutex;

/// Run-level metadata carried into the snapshot.
#[derive(Debug, Clone)]
pub struct IndexMeta {
    /// Project root as a `file://` URI.
    pub project_root: Box<str>,
    pub format: OutputFormat,
    pub debug: bool,
}

#[derive(Debug, Default)]
struct Stores {
    symbols: SymbolStore,
    refs: RefStore,
    relations: RelationStore,
}

/// The single point of contention between workers.
///
/// Intake never fails on valid input; a reference or relation naming an
/// identity with no corresponding symbol is stored as-is and only resolved
/// (skipped and counted) at serialization time.
#[derive(Debug, Default)]
pub struct Aggregator {
    stores: Mutex<Stores>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one unit's symbol observations into the store, merging with
    /// whatever earlier units reported about the same identities.
    pub fn ingest_symbols<I>(&self, batch: I)
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut stores = self.stores.lock();
        for symbol in batch {
            stores.symbols.insert(symbol);
        }
    }

    pub fn ingest_refs<I>(&self, batch: I)
    where
        I: IntoIterator<Item = (SymbolId, Ref)>,
    {
        let mut stores = self.stores.lock();
        for (id, reference) in batch {
            stores.refs.insert(id, reference);
        }
    }

    pub fn ingest_relations<I>(&self, batch: I)
    where
        I: IntoIterator<Item = Relation>,
    {
        let mut stores = self.stores.lock();
        for relation in batch {
            stores.relations.insert(relation);
        }
    }

    /// Apply one compilation unit's three batches under a single lock
    /// acquisition, so the unit's symbols, refs, and relations become
    /// visible together.
    pub fn ingest_shard(&self, shard: Shard) {
        let mut stores = self.stores.lock();
        for symbol in shard.symbols {
            stores.symbols.insert(symbol);
        }
        for observation in shard.refs {
            stores
                .refs
                .insert(observation.symbol, Ref::new(observation.location, observation.kind));
        }
        for relation in shard.relations {
            stores.relations.insert(relation);
        }
    }

    /// Freeze collection into an immutable snapshot.
    ///
    /// The caller must have joined all workers first; taking `self` by value
    /// enforces that no further intake can happen. Iteration order is
    /// canonicalized here (everything sorted by identity) so serialization
    /// is deterministic regardless of arrival order.
    pub fn freeze(self, meta: IndexMeta) -> Snapshot {
        let stores = self.stores.into_inner();
        let snapshot = Snapshot {
            symbols: stores.symbols.into_sorted(),
            refs: stores.refs.into_sorted(),
            relations: stores.relations.into_sorted(),
            meta,
        };
        tracing::info!(
            target: "aggregate",
            "frozen index: {} symbols, {} referenced, {} relations",
            snapshot.symbols.len(),
            snapshot.refs.len(),
            snapshot.relations.len(),
        );
        snapshot
    }
}

/// The frozen, fully merged index. Immutable once constructed; the
/// serializer borrows it read-only for a single traversal.
#[derive(Debug)]
pub struct Snapshot {
    symbols: Vec<Symbol>,
    refs: Vec<(SymbolId, Vec<Ref>)>,
    relations: Vec<Relation>,
    meta: IndexMeta,
}

impl Snapshot {
    /// All symbols, sorted by identity.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol(&self, id: &SymbolId) -> Option<&Symbol> {
        self.symbols
            .binary_search_by_key(id, |symbol| symbol.id)
            .ok()
            .map(|pos| &self.symbols[pos])
    }

    pub fn contains_symbol(&self, id: &SymbolId) -> bool {
        self.symbol(id).is_some()
    }

    /// Reference occurrences grouped per symbol, sorted by identity.
    pub fn refs(&self) -> &[(SymbolId, Vec<Ref>)] {
        &self.refs
    }

    pub fn refs_for(&self, id: &SymbolId) -> &[Ref] {
        match self.refs.binary_search_by_key(id, |(entry_id, _)| *entry_id) {
            Ok(pos) => &self.refs[pos].1,
            Err(_) => &[],
        }
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Range, RefKind, SymbolKind};

    fn meta() -> IndexMeta {
        IndexMeta {
            project_root: "file:///project".into(),
            format: OutputFormat::Lsif,
            debug: false,
        }
    }

    fn foo_observation() -> Symbol {
        Symbol::new(SymbolId::from_usr("c:@F@foo#"), "foo", SymbolKind::Function)
            .with_references(1)
    }

    #[test]
    fn concurrent_batches_sum_reference_counters() {
        let aggregator = Aggregator::new();

        // 100 workers, each reporting the same identity with one reference.
        std::thread::scope(|scope| {
            for _ in 0..100 {
                scope.spawn(|| aggregator.ingest_symbols([foo_observation()]));
            }
        });

        let snapshot = aggregator.freeze(meta());
        assert_eq!(snapshot.symbols().len(), 1);
        assert_eq!(snapshot.symbols()[0].references, 100);
    }

    #[test]
    fn final_state_is_independent_of_worker_interleaving() {
        let id = SymbolId::from_usr("c:@F@foo#");
        let reference = Ref::new(
            Location::new("main.c", Range::new(5, 4, 5, 7)),
            RefKind::CALL,
        );

        let aggregator = Aggregator::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let reference = reference.clone();
                let aggregator = &aggregator;
                scope.spawn(move || {
                    aggregator.ingest_symbols([foo_observation()]);
                    aggregator.ingest_refs([(id, reference)]);
                });
            }
        });

        let snapshot = aggregator.freeze(meta());
        // Duplicate occurrences from overlapping workers collapse.
        assert_eq!(snapshot.refs_for(&id).len(), 1);
        assert_eq!(snapshot.symbols()[0].references, 8);
    }

    #[test]
    fn freeze_sorts_symbols_by_identity() {
        let aggregator = Aggregator::new();
        for usr in ["c:@F@c#", "c:@F@a#", "c:@F@b#"] {
            aggregator.ingest_symbols([Symbol::new(
                SymbolId::from_usr(usr),
                "x",
                SymbolKind::Function,
            )]);
        }

        let snapshot = aggregator.freeze(meta());
        let ids: Vec<_> = snapshot.symbols().iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn lookups_on_the_snapshot() {
        let aggregator = Aggregator::new();
        aggregator.ingest_symbols([foo_observation()]);
        let id = SymbolId::from_usr("c:@F@foo#");
        aggregator.ingest_refs([(
            id,
            Ref::new(Location::new("main.c", Range::new(1, 0, 1, 3)), RefKind::CALL),
        )]);

        let snapshot = aggregator.freeze(meta());
        assert!(snapshot.contains_symbol(&id));
        assert_eq!(snapshot.symbol(&id).unwrap().name.as_ref(), "foo");
        assert_eq!(snapshot.refs_for(&id).len(), 1);
        assert!(!snapshot.contains_symbol(&SymbolId::from_usr("c:@F@ghost#")));
        assert!(snapshot.refs_for(&SymbolId::from_usr("c:@F@ghost#")).is_empty());
    }
}
