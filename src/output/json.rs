//! Human-readable dump of the merged index, one JSON record per line.
//!
//! No graph structure, no resolution: exactly what the stores held at
//! freeze time, which makes it the format of choice when debugging a
//! surprising merge.

use super::{OutputError, WriteSummary};
use crate::aggregate::Snapshot;
use serde_json::json;
use std::io::Write;

pub fn write_dump(snapshot: &Snapshot, out: &mut impl Write) -> Result<WriteSummary, OutputError> {
    let mut summary = WriteSummary::default();

    write_record(
        out,
        &json!({
            "index": {
                "projectRoot": snapshot.meta().project_root,
                "symbols": snapshot.symbols().len(),
                "relations": snapshot.relations().len(),
            },
        }),
    )?;

    for symbol in snapshot.symbols() {
        write_record(out, &json!({ "symbol": symbol }))?;
        summary.symbols += 1;
    }
    for (id, occurrences) in snapshot.refs() {
        write_record(out, &json!({ "refs": { "symbol": id, "occurrences": occurrences } }))?;
    }
    for relation in snapshot.relations() {
        write_record(out, &json!({ "relation": relation }))?;
    }

    Ok(summary)
}

fn write_record(out: &mut impl Write, record: &serde_json::Value) -> Result<(), OutputError> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregator, IndexMeta};
    use crate::output::OutputFormat;
    use crate::symbol::Symbol;
    use crate::types::{SymbolId, SymbolKind};

    #[test]
    fn dump_lists_every_symbol_once() {
        let aggregator = Aggregator::new();
        aggregator.ingest_symbols([
            Symbol::new(SymbolId::from_usr("c:@F@foo#"), "foo", SymbolKind::Function),
            Symbol::new(SymbolId::from_usr("c:@F@bar#"), "bar", SymbolKind::Function),
        ]);
        let snapshot = aggregator.freeze(IndexMeta {
            project_root: "file:///project".into(),
            format: OutputFormat::Json,
            debug: false,
        });

        let mut buffer = Vec::new();
        let summary = write_dump(&snapshot, &mut buffer).unwrap();
        assert_eq!(summary.symbols, 2);

        let text = String::from_utf8(buffer).unwrap();
        let symbol_lines = text.lines().filter(|l| l.contains("\"symbol\"")).count();
        assert_eq!(symbol_lines, 2);
        assert!(text.lines().next().unwrap().contains("projectRoot"));
    }
}
