//! Symbol records and the observation merge algorithm.
//!
//! Each compilation unit reports its own view of every symbol it touches.
//! A symbol declared in a shared header is therefore observed many times,
//! each observation partial: one unit sees only the declaration, another the
//! definition and the doc comment. [`merge`] folds two observations of the
//! same identity into one record without ever failing; conflicting inputs
//! are resolved by a first-seen policy rather than rejected.

use crate::types::{Location, SymbolFlags, SymbolId, SymbolKind};
use serde::{Deserialize, Serialize};

/// One symbol as known to the index: either a single unit's observation or
/// the result of merging several of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: Box<str>,
    pub kind: SymbolKind,
    /// Declaration sites. Kept as a set (no duplicate locations).
    #[serde(default)]
    pub declarations: Vec<Location>,
    /// Definition site, when some unit has seen one.
    #[serde(default)]
    pub definition: Option<Location>,
    /// Reference count reported by the front-end. Accumulates across merges;
    /// dedup at compilation-unit granularity is the front-end's job.
    #[serde(default)]
    pub references: u32,
    #[serde(default)]
    pub documentation: Box<str>,
    #[serde(default)]
    pub flags: SymbolFlags,
}

impl Symbol {
    pub fn new(id: SymbolId, name: impl Into<Box<str>>, kind: SymbolKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            declarations: Vec::new(),
            definition: None,
            references: 0,
            documentation: "".into(),
            flags: SymbolFlags::empty(),
        }
    }

    pub fn with_declaration(mut self, location: Location) -> Self {
        self.declarations.push(location);
        self
    }

    pub fn with_definition(mut self, location: Location) -> Self {
        self.definition = Some(location);
        self
    }

    pub fn with_references(mut self, count: u32) -> Self {
        self.references = count;
        self
    }

    pub fn with_documentation(mut self, doc: impl Into<Box<str>>) -> Self {
        self.documentation = doc.into();
        self
    }

    pub fn with_flags(mut self, flags: SymbolFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Fold observation `b` into observation `a` of the same identity.
///
/// Resolution policy, applied left-to-right in replay order:
/// - name/kind: `a` wins on disagreement (first-seen). A mismatch is a
///   data-quality anomaly from the front-end, logged and tolerated.
/// - declarations: set union, `a`'s order first.
/// - definition: `a`'s if present, else `b`'s.
/// - references: saturating sum.
/// - documentation: first non-empty.
/// - flags: bitwise OR.
///
/// Total by construction: always yields a record, never an error. Because
/// the tie-breaks favor the left operand, merge is commutative only for
/// non-conflicting observations; under concurrent delivery the winner is
/// whichever batch acquired the aggregator lock first.
pub fn merge(a: &Symbol, b: &Symbol) -> Symbol {
    debug_assert_eq!(a.id, b.id, "merge requires matching identities");

    if a.name != b.name || a.kind != b.kind {
        tracing::debug!(
            target: "merge",
            "conflicting observations for {}: keeping {:?} {} over {:?} {}",
            a.id, a.kind, a.name, b.kind, b.name,
        );
    }

    let mut merged = a.clone();
    for location in &b.declarations {
        if !merged.declarations.contains(location) {
            merged.declarations.push(location.clone());
        }
    }
    if merged.definition.is_none() {
        merged.definition = b.definition.clone();
    }
    merged.references = merged.references.saturating_add(b.references);
    if merged.documentation.is_empty() {
        merged.documentation = b.documentation.clone();
    }
    merged.flags |= b.flags;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Range;

    fn loc(file: &str, line: u32) -> Location {
        Location::new(file, Range::new(line, 0, line, 10))
    }

    fn observation(name: &str) -> Symbol {
        Symbol::new(SymbolId::from_usr("c:@F@foo#"), name, SymbolKind::Function)
    }

    #[test]
    fn merge_is_idempotent_except_reference_counter() {
        let sym = observation("foo")
            .with_declaration(loc("foo.h", 3))
            .with_definition(loc("foo.c", 10))
            .with_references(1)
            .with_documentation("Does foo.");

        let twice = merge(&sym, &sym);
        assert_eq!(twice.declarations, sym.declarations);
        assert_eq!(twice.definition, sym.definition);
        assert_eq!(twice.documentation, sym.documentation);
        assert_eq!(twice.flags, sym.flags);
        // The counter is defined to accumulate.
        assert_eq!(twice.references, 2);
    }

    #[test]
    fn reference_counters_sum_across_repeated_merges() {
        let unit = observation("foo").with_references(1);
        let mut merged = unit.clone();
        for _ in 0..9 {
            merged = merge(&merged, &unit);
        }
        assert_eq!(merged.references, 10);
    }

    #[test]
    fn merge_commutes_for_disjoint_observations() {
        let a = observation("foo")
            .with_declaration(loc("foo.h", 3))
            .with_references(2);
        let b = observation("foo")
            .with_definition(loc("foo.c", 10))
            .with_references(1)
            .with_documentation("Does foo.");

        let ab = merge(&a, &b);
        let ba = merge(&b, &a);
        assert_eq!(ab.declarations, ba.declarations);
        assert_eq!(ab.definition, ba.definition);
        assert_eq!(ab.references, ba.references);
        assert_eq!(ab.documentation, ba.documentation);
    }

    #[test]
    fn conflicting_name_keeps_first_seen() {
        let a = observation("foo");
        let b = observation("foo_renamed");
        assert_eq!(merge(&a, &b).name.as_ref(), "foo");
        assert_eq!(merge(&b, &a).name.as_ref(), "foo_renamed");
    }

    #[test]
    fn first_definition_wins_when_both_present() {
        let a = observation("foo").with_definition(loc("old.c", 1));
        let b = observation("foo").with_definition(loc("new.c", 2));
        assert_eq!(merge(&a, &b).definition, Some(loc("old.c", 1)));
    }

    #[test]
    fn missing_fields_fill_from_the_other_side() {
        let a = observation("foo").with_declaration(loc("foo.h", 3));
        let b = observation("foo")
            .with_definition(loc("foo.c", 10))
            .with_documentation("Does foo.");

        let merged = merge(&a, &b);
        assert_eq!(merged.declarations, vec![loc("foo.h", 3)]);
        assert_eq!(merged.definition, Some(loc("foo.c", 10)));
        assert_eq!(merged.documentation.as_ref(), "Does foo.");
    }

    #[test]
    fn first_nonempty_documentation_wins() {
        let a = observation("foo").with_documentation("First.");
        let b = observation("foo").with_documentation("Second.");
        assert_eq!(merge(&a, &b).documentation.as_ref(), "First.");
        assert_eq!(merge(&b, &a).documentation.as_ref(), "Second.");
    }

    #[test]
    fn declarations_union_without_duplicates() {
        let a = observation("foo")
            .with_declaration(loc("foo.h", 3))
            .with_declaration(loc("other.h", 7));
        let b = observation("foo")
            .with_declaration(loc("foo.h", 3)) // same site, seen by another unit
            .with_declaration(loc("third.h", 1));

        let merged = merge(&a, &b);
        assert_eq!(
            merged.declarations,
            vec![loc("foo.h", 3), loc("other.h", 7), loc("third.h", 1)]
        );
    }

    #[test]
    fn flags_accumulate_with_or() {
        let a = observation("foo").with_flags(SymbolFlags::IMPLICIT);
        let b = observation("foo").with_flags(SymbolFlags::DEPRECATED);
        let merged = merge(&a, &b);
        assert!(merged.flags.contains(SymbolFlags::IMPLICIT | SymbolFlags::DEPRECATED));
    }
}
