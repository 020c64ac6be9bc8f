//! Graph serialization of a frozen snapshot.
//!
//! One format is selected per run through [`OutputFormat`]; the LSIF
//! vertex/edge protocol is the primary one, the JSON dump exists for humans
//! and for debugging merges. Serialization is a single forward pass writing
//! records incrementally; a stream failure aborts the run with no partial
//! recovery.

pub mod json;
pub mod lsif;

use crate::aggregate::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Output protocol selector. The serializer dispatch is the one place that
/// matches on this, so adding a variant means adding exactly one arm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// LSIF vertex/edge graph, one JSON record per line.
    #[default]
    Lsif,
    /// Plain JSON dump of the merged index, one record per line.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lsif => write!(f, "lsif"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write index output: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the serializer did, for caller-level diagnostics: a run with
/// anomalies still succeeds, the counts say what was skipped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub symbols: usize,
    pub documents: usize,
    pub ranges: usize,
    pub dangling_refs: usize,
    pub dangling_relations: usize,
}

/// Serialize `snapshot` in its configured format.
pub fn write_index(
    snapshot: &Snapshot,
    out: &mut impl Write,
) -> Result<WriteSummary, OutputError> {
    match snapshot.meta().format {
        OutputFormat::Lsif => lsif::LsifWriter::new(out).write(snapshot),
        OutputFormat::Json => json::write_dump(snapshot, out),
    }
}

/// Express an absolute path as a `file://` URI.
pub fn file_uri(path: &Path) -> String {
    let normalized = path.display().to_string().replace('\\', "/");
    if normalized.starts_with('/') {
        format!("file://{normalized}")
    } else {
        format!("file:///{normalized}")
    }
}
