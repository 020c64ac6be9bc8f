//! LSIF emission: one forward pass over the snapshot.
//!
//! The stream is append-only. Vertices get monotonically increasing numeric
//! ids, and every edge is emitted strictly after both of its endpoints, so a
//! consumer can process the dump line by line without random access. A
//! reference or relation naming an identity the symbol store never saw
//! produces no edge at all, only a diagnostic count.

use super::{OutputError, WriteSummary};
use crate::aggregate::{IndexMeta, Snapshot};
use crate::symbol::Symbol;
use crate::types::{Location, SymbolId, SymbolKind};
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::Write;

pub const PROTOCOL_VERSION: &str = "0.4.3";
pub const POSITION_ENCODING: &str = "utf-16";
const MONIKER_SCHEME: &str = "loom";

/// Single-shot LSIF writer. Constructed idle, consumed by [`Self::write`];
/// a failed write poisons nothing because the writer is gone.
pub struct LsifWriter<'a, W: Write> {
    out: &'a mut W,
    next_id: u64,
    project_root: String,
    debug: bool,
    /// source file -> document vertex id
    documents: HashMap<Box<str>, u64>,
    /// document vertex id -> range ids it contains, in emission order
    contains: IndexMap<u64, Vec<u64>>,
    /// symbol identity -> resultSet vertex id, for relation edges
    result_sets: HashMap<SymbolId, u64>,
    summary: WriteSummary,
}

impl<'a, W: Write> LsifWriter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self {
            out,
            next_id: 0,
            project_root: String::new(),
            debug: false,
            documents: HashMap::new(),
            contains: IndexMap::new(),
            result_sets: HashMap::new(),
            summary: WriteSummary::default(),
        }
    }

    /// Emit the whole graph. Symbols drive the traversal; loose ends
    /// (references and relations to unknown identities) are skipped and
    /// counted afterwards.
    pub fn write(mut self, snapshot: &Snapshot) -> Result<WriteSummary, OutputError> {
        self.write_meta(snapshot.meta())?;

        for symbol in snapshot.symbols() {
            self.write_symbol(snapshot, symbol)?;
        }

        for (id, occurrences) in snapshot.refs() {
            if !snapshot.contains_symbol(id) {
                tracing::warn!(
                    target: "output",
                    "skipping {} reference(s) to unknown symbol {id}",
                    occurrences.len(),
                );
                self.summary.dangling_refs += occurrences.len();
            }
        }

        for relation in snapshot.relations() {
            let subject = self.result_sets.get(&relation.subject).copied();
            let object = self.result_sets.get(&relation.object).copied();
            match (subject, object) {
                (Some(subject), Some(object)) => {
                    self.emit_edge(relation.predicate.label(), subject, object)?;
                }
                _ => {
                    tracing::warn!(
                        target: "output",
                        "skipping {} relation with unknown endpoint: {} -> {}",
                        relation.predicate.label(),
                        relation.subject,
                        relation.object,
                    );
                    self.summary.dangling_relations += 1;
                }
            }
        }

        self.write_contains()?;
        Ok(self.summary)
    }

    fn write_meta(&mut self, meta: &IndexMeta) -> Result<(), OutputError> {
        self.project_root = meta.project_root.to_string();
        self.debug = meta.debug;
        let id = self.fresh_id();
        self.write_record(&json!({
            "id": id,
            "type": "vertex",
            "label": "metaData",
            "version": PROTOCOL_VERSION,
            "projectRoot": self.project_root,
            "positionEncoding": POSITION_ENCODING,
            "toolInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        }))
    }

    /// Everything hanging off one symbol: resultSet, moniker, hover,
    /// declaration/definition ranges, and the definition/reference results.
    fn write_symbol(&mut self, snapshot: &Snapshot, symbol: &Symbol) -> Result<(), OutputError> {
        let result_set = self.emit_vertex("resultSet", json!({}))?;
        self.result_sets.insert(symbol.id, result_set);
        self.summary.symbols += 1;

        let moniker = self.emit_vertex(
            "moniker",
            json!({
                "kind": "export",
                "scheme": MONIKER_SCHEME,
                "identifier": format!("{}:{}", symbol.id, symbol.name),
            }),
        )?;
        self.emit_edge("moniker", result_set, moniker)?;

        if !symbol.documentation.is_empty() {
            let hover = self.emit_vertex(
                "hoverResult",
                json!({
                    "result": {
                        "contents": { "kind": "markdown", "value": symbol.documentation },
                    },
                }),
            )?;
            self.emit_edge("textDocument/hover", result_set, hover)?;
        }

        for declaration in &symbol.declarations {
            let (range, _) = self.range_vertex(declaration, None)?;
            self.emit_edge("next", range, result_set)?;
        }

        let mut definition = None;
        if let Some(location) = &symbol.definition {
            let tag = self
                .debug
                .then(|| (symbol.name.as_ref().to_string(), symbol.kind));
            let (range, document) = self.range_vertex(location, tag)?;
            self.emit_edge("next", range, result_set)?;

            let definition_result = self.emit_vertex("definitionResult", json!({}))?;
            self.emit_edge("textDocument/definition", result_set, definition_result)?;
            self.emit_item(definition_result, &[range], document, None)?;
            definition = Some((range, document));
        }

        let occurrences = snapshot.refs_for(&symbol.id);
        if !occurrences.is_empty() {
            let reference_result = self.emit_vertex("referenceResult", json!({}))?;
            self.emit_edge("textDocument/references", result_set, reference_result)?;

            if let Some((range, document)) = definition {
                self.emit_item(reference_result, &[range], document, Some("definitions"))?;
            }

            // Item edges are grouped per document, in first-use order.
            let mut per_document: IndexMap<u64, Vec<u64>> = IndexMap::new();
            for occurrence in occurrences {
                let (range, document) = self.range_vertex(&occurrence.location, None)?;
                self.emit_edge("next", range, result_set)?;
                per_document.entry(document).or_default().push(range);
            }
            for (document, ranges) in per_document {
                self.emit_item(reference_result, &ranges, document, Some("references"))?;
            }
        }

        Ok(())
    }

    /// Emit a range vertex attached to its document, creating the document
    /// vertex on first use. Returns `(range id, document id)`.
    fn range_vertex(
        &mut self,
        location: &Location,
        tag: Option<(String, SymbolKind)>,
    ) -> Result<(u64, u64), OutputError> {
        let document = self.document_id(&location.file)?;
        let id = self.fresh_id();

        let mut record = json!({
            "id": id,
            "type": "vertex",
            "label": "range",
            "start": position(location.range.start_line, location.range.start_column),
            "end": position(location.range.end_line, location.range.end_column),
        });
        if let Some((text, kind)) = tag {
            record["tag"] = json!({
                "type": "definition",
                "text": text,
                "kind": lsp_symbol_kind(kind),
                "fullRange": {
                    "start": position(location.range.start_line, location.range.start_column),
                    "end": position(location.range.end_line, location.range.end_column),
                },
            });
        }
        self.write_record(&record)?;

        self.contains.entry(document).or_default().push(id);
        self.summary.ranges += 1;
        Ok((id, document))
    }

    fn document_id(&mut self, file: &str) -> Result<u64, OutputError> {
        if let Some(&id) = self.documents.get(file) {
            return Ok(id);
        }
        let id = self.fresh_id();
        self.write_record(&json!({
            "id": id,
            "type": "vertex",
            "label": "document",
            "uri": document_uri(&self.project_root, file),
            "languageId": language_id(file),
        }))?;
        self.documents.insert(file.into(), id);
        self.summary.documents += 1;
        Ok(id)
    }

    fn write_contains(&mut self) -> Result<(), OutputError> {
        let contains = std::mem::take(&mut self.contains);
        for (document, ranges) in contains {
            let id = self.fresh_id();
            self.write_record(&json!({
                "id": id,
                "type": "edge",
                "label": "contains",
                "outV": document,
                "inVs": ranges,
            }))?;
        }
        Ok(())
    }

    fn emit_vertex(&mut self, label: &str, mut extra: Value) -> Result<u64, OutputError> {
        let id = self.fresh_id();
        if let Some(fields) = extra.as_object_mut() {
            fields.insert("id".into(), json!(id));
            fields.insert("type".into(), json!("vertex"));
            fields.insert("label".into(), json!(label));
        }
        self.write_record(&extra)?;
        Ok(id)
    }

    fn emit_edge(&mut self, label: &str, out_v: u64, in_v: u64) -> Result<(), OutputError> {
        let id = self.fresh_id();
        self.write_record(&json!({
            "id": id,
            "type": "edge",
            "label": label,
            "outV": out_v,
            "inV": in_v,
        }))
    }

    fn emit_item(
        &mut self,
        out_v: u64,
        in_vs: &[u64],
        document: u64,
        property: Option<&str>,
    ) -> Result<(), OutputError> {
        let id = self.fresh_id();
        let mut record = json!({
            "id": id,
            "type": "edge",
            "label": "item",
            "outV": out_v,
            "inVs": in_vs,
            "document": document,
        });
        if let Some(property) = property {
            record["property"] = json!(property);
        }
        self.write_record(&record)
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn write_record(&mut self, record: &Value) -> Result<(), OutputError> {
        serde_json::to_writer(&mut *self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

fn position(line: u32, character: u16) -> Value {
    json!({ "line": line, "character": character })
}

/// Resolve a front-end-reported file to the URI the graph uses.
fn document_uri(project_root: &str, file: &str) -> String {
    if file.starts_with("file://") {
        file.to_string()
    } else if file.starts_with('/') {
        format!("file://{file}")
    } else {
        format!("{}/{}", project_root.trim_end_matches('/'), file)
    }
}

fn language_id(file: &str) -> &'static str {
    let extension = file.rsplit('.').next().unwrap_or("");
    match extension {
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hh" | "hpp" => "cpp",
        "go" => "go",
        "java" => "java",
        "js" => "javascript",
        "py" => "python",
        "rs" => "rust",
        "ts" => "typescript",
        _ => "plaintext",
    }
}

fn lsp_symbol_kind(kind: SymbolKind) -> u8 {
    match kind {
        SymbolKind::Module => 2,
        SymbolKind::Class => 5,
        SymbolKind::Method => 6,
        SymbolKind::Field => 8,
        SymbolKind::Enum => 10,
        SymbolKind::Trait | SymbolKind::Interface => 11,
        SymbolKind::Function | SymbolKind::Macro => 12,
        SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Unknown => 13,
        SymbolKind::Constant => 14,
        SymbolKind::Struct => 23,
        SymbolKind::TypeAlias => 26,
    }
}
