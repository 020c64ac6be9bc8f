//! The three deduplicating stores the aggregator folds observations into.

pub mod refs;
pub mod relations;
pub mod symbols;

pub use refs::{Ref, RefStore};
pub use relations::RelationStore;
pub use symbols::SymbolStore;
