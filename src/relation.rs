//! Directed relations between symbols (inheritance, overriding, extension).

use crate::types::SymbolId;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BaseOf,
    OverriddenBy,
    Extends,
}

impl RelationKind {
    /// Edge label used by the exported graph.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BaseOf => "baseOf",
            Self::OverriddenBy => "overriddenBy",
            Self::Extends => "extends",
        }
    }
}

/// A `(subject, predicate, object)` triple, e.g. "A is base of B".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Relation {
    pub subject: SymbolId,
    pub predicate: RelationKind,
    pub object: SymbolId,
}

impl Relation {
    pub fn new(subject: SymbolId, predicate: RelationKind, object: SymbolId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}
