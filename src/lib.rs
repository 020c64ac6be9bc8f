pub mod aggregate;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod output;
pub mod relation;
pub mod store;
pub mod symbol;
pub mod types;

pub use aggregate::{Aggregator, IndexMeta, Snapshot};
pub use config::Settings;
pub use ingest::{IngestError, LoadStats, Shard, collect_shard_paths, load_shards, read_shard};
pub use output::{OutputError, OutputFormat, WriteSummary, file_uri, write_index};
pub use relation::{Relation, RelationKind};
pub use store::{Ref, RefStore, RelationStore, SymbolStore};
pub use symbol::{Symbol, merge};
pub use types::*;
