//! Shard files: the observation batches an external analysis front-end
//! emits, one JSON document per compilation unit.
//!
//! Reading and parsing happen here, off-lock, on a rayon pool; only the
//! already-decoded batches ever enter the aggregator's critical section.
//! A shard that fails to load is logged and counted, never fatal: the index
//! stays consistent with whatever did arrive, and the caller decides what
//! the failure count means for the exit status.

use crate::aggregate::Aggregator;
use crate::relation::Relation;
use crate::symbol::Symbol;
use crate::types::{Location, RefKind, SymbolId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// One reference occurrence as reported by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefObservation {
    pub symbol: SymbolId,
    pub location: Location,
    pub kind: RefKind,
}

/// Everything one compilation unit observed: the three batch types of the
/// intake contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    /// The compilation unit this shard was produced from.
    pub unit: Box<str>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub refs: Vec<RefObservation>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Shard {
    pub fn new(unit: impl Into<Box<str>>) -> Self {
        Self {
            unit: unit.into(),
            symbols: Vec::new(),
            refs: Vec::new(),
            relations: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read shard {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse shard {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn read_shard(path: &Path) -> Result<Shard, IngestError> {
    let content = fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand the command-line inputs into concrete shard files: files pass
/// through untouched, directories are walked for `*.json` entries. Sorted
/// walk order keeps logs reproducible; the merge result does not depend on
/// it.
pub fn collect_shard_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                match entry {
                    Ok(entry)
                        if entry.file_type().is_file()
                            && entry.path().extension().is_some_and(|ext| ext == "json") =>
                    {
                        paths.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(
                            target: "ingest",
                            "skipping unreadable entry under {}: {err}",
                            input.display(),
                        );
                    }
                }
            }
        } else {
            paths.push(input.clone());
        }
    }
    paths
}

/// Outcome of one load pass over a set of shards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub units_ok: usize,
    pub units_failed: usize,
}

impl LoadStats {
    pub fn all_ok(&self) -> bool {
        self.units_failed == 0
    }
}

/// Load every shard in parallel and fold it into the aggregator.
///
/// Each rayon task plays the role of one analysis worker: read and decode
/// off-lock, then ingest the whole unit atomically.
pub fn load_shards(paths: &[PathBuf], aggregator: &Aggregator) -> LoadStats {
    let units_failed: usize = paths
        .par_iter()
        .map(|path| match read_shard(path) {
            Ok(shard) => {
                tracing::debug!(
                    target: "ingest",
                    "merging unit {} ({} symbols, {} refs, {} relations)",
                    shard.unit,
                    shard.symbols.len(),
                    shard.refs.len(),
                    shard.relations.len(),
                );
                aggregator.ingest_shard(shard);
                0
            }
            Err(err) => {
                tracing::error!(target: "ingest", "{err}");
                1
            }
        })
        .sum();

    LoadStats {
        units_ok: paths.len() - units_failed,
        units_failed,
    }
}
