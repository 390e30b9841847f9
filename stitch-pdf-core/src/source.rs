//! Loading a complete PDF into an object table.
//!
//! The loader scans the buffer for `N G obj` headers rather than walking the
//! cross-reference table, which tolerates files whose xref offsets are stale.
//! Later definitions of the same object number win, approximating
//! incremental updates.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::diagnostics::DiagnosticSink;
use crate::document::{ObjectTable, MAX_RESOLVE_DEPTH};
use crate::destination::Destination;
use crate::error::{PdfError, Result};
use crate::objects::{DocumentId, ObjRef, Object, PdfString};
use crate::reader::{read_object, ReadContext, Resolver};

lazy_static! {
    static ref OBJ_HEADER: Regex =
        Regex::new(r"(?-u)(\d+)[\x00\t\n\x0c\r ]+(\d+)[\x00\t\n\x0c\r ]+obj\b")
            .expect("object header pattern");
}

/// One level of an outline: items, with a nested group following the item
/// that heads it.
#[derive(Debug, Clone)]
pub enum OutlineNode {
    Item(Destination),
    Group(Vec<OutlineNode>),
}

/// A parsed input document: its object table, flattened page list, and the
/// navigation structures the merger consumes.
#[derive(Debug)]
pub struct SourceDocument {
    table: ObjectTable,
    catalog: ObjRef,
    pages: Vec<ObjRef>,
    strict: bool,
}

impl SourceDocument {
    pub fn open(
        path: impl AsRef<Path>,
        strict: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, strict, sink)
    }

    pub fn from_bytes(
        bytes: &[u8],
        strict: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self> {
        let mut table = ObjectTable::new();
        let doc = table.document_id();

        let mut spans: HashMap<(u64, u32), u64> = HashMap::new();
        for caps in OBJ_HEADER.captures_iter(bytes) {
            let id = ascii_number(&caps[1]);
            let gen = ascii_number(&caps[2]) as u32;
            let end = caps
                .get(0)
                .map(|m| m.end() as u64)
                .unwrap_or_default();
            spans.insert((id, gen), end);
        }
        if spans.is_empty() {
            return Err(PdfError::Consistency(
                "no indirect objects found in document".to_string(),
            ));
        }

        let mut resolver = SpanResolver {
            data: bytes,
            spans: &spans,
            doc,
            strict,
            depth: 0,
        };
        for (&(id, gen), &offset) in &spans {
            let mut cur = Cursor::new(bytes);
            cur.seek(SeekFrom::Start(offset))?;
            let obj = {
                let mut cx = ReadContext {
                    doc,
                    strict,
                    sink: &mut *sink,
                    resolver: Some(&mut resolver),
                };
                read_object(&mut cur, &mut cx)?
            };
            table.insert(ObjRef { id, gen, doc }, obj)?;
        }

        let catalog = find_catalog(bytes, &table, strict, sink, &mut resolver)?;
        let mut pages = Vec::new();
        let pages_root = match table.resolve_dict(catalog)?.get("Pages") {
            Some(Object::Reference(r)) => *r,
            _ => {
                return Err(PdfError::Consistency(
                    "catalog has no /Pages reference".to_string(),
                ))
            }
        };
        collect_pages(&table, pages_root, &mut pages, 0)?;

        Ok(SourceDocument {
            table,
            catalog,
            pages,
            strict,
        })
    }

    pub fn table(&self) -> &ObjectTable {
        &self.table
    }

    pub fn document_id(&self) -> DocumentId {
        self.table.document_id()
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[ObjRef] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Result<ObjRef> {
        self.pages.get(index).copied().ok_or_else(|| {
            PdfError::Consistency(format!(
                "page index {index} out of range ({} pages)",
                self.pages.len()
            ))
        })
    }

    /// The outline tree. Entries missing a usable title or destination are
    /// skipped with a warning.
    pub fn outline(&self, sink: &mut dyn DiagnosticSink) -> Result<Vec<OutlineNode>> {
        let catalog = self.table.resolve_dict(self.catalog)?;
        let Some(Object::Reference(outlines)) = catalog.get("Outlines") else {
            return Ok(Vec::new());
        };
        let root = self.table.resolve_dict(*outlines)?;
        let first = root.get("First").and_then(Object::as_reference);
        self.walk_outline_level(first, 0, sink)
    }

    fn walk_outline_level(
        &self,
        first: Option<ObjRef>,
        depth: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<OutlineNode>> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(PdfError::Consistency(
                "outline nesting too deep".to_string(),
            ));
        }
        let mut out = Vec::new();
        let mut cur = first;
        let budget = self.table.len() + 1;
        let mut steps = 0usize;
        while let Some(node_ref) = cur {
            steps += 1;
            if steps > budget {
                return Err(PdfError::Consistency(
                    "sibling cycle in outline".to_string(),
                ));
            }
            let node = self.table.resolve_dict(node_ref)?;
            match self.outline_item(node)? {
                Some(dest) => out.push(OutlineNode::Item(dest)),
                None => sink.warning("skipping outline entry without title and destination"),
            }
            if let Some(child_first) = node.get("First").and_then(Object::as_reference) {
                let sub = self.walk_outline_level(Some(child_first), depth + 1, sink)?;
                if !sub.is_empty() {
                    out.push(OutlineNode::Group(sub));
                }
            }
            cur = node.get("Next").and_then(Object::as_reference);
        }
        Ok(out)
    }

    fn outline_item(&self, node: &crate::objects::Dictionary) -> Result<Option<Destination>> {
        let Some(title) = node
            .get("Title")
            .map(|t| self.table.resolve(t))
            .transpose()?
            .and_then(Object::as_string)
        else {
            return Ok(None);
        };
        let target = if let Some(action) = node.get("A") {
            self.table
                .resolve(action)?
                .as_dict()
                .and_then(|a| a.get("D"))
        } else {
            node.get("Dest")
        };
        let Some(target) = target else {
            return Ok(None);
        };
        match self.table.resolve(target)? {
            Object::Array(array) => Ok(Destination::from_array(title.clone(), array).ok()),
            _ => Ok(None),
        }
    }

    /// Named destinations from the catalog's `/Dests` dictionary or the
    /// `/Names` name tree, titled by their key.
    pub fn named_destinations(&self, sink: &mut dyn DiagnosticSink) -> Result<Vec<Destination>> {
        let catalog = self.table.resolve_dict(self.catalog)?;
        let mut out = Vec::new();
        if let Some(dests) = catalog.get("Dests") {
            if let Object::Dictionary(dests) = self.table.resolve(dests)? {
                for (name, value) in dests.iter() {
                    self.push_named_dest(
                        PdfString::text(name.as_str()),
                        value,
                        &mut out,
                        sink,
                    )?;
                }
            }
        } else if let Some(names) = catalog.get("Names") {
            if let Object::Dictionary(names) = self.table.resolve(names)? {
                if let Some(tree) = names.get("Dests") {
                    let tree = self.table.resolve(tree)?.clone();
                    self.collect_name_tree(&tree, &mut out, 0, sink)?;
                }
            }
        }
        Ok(out)
    }

    fn collect_name_tree(
        &self,
        node: &Object,
        out: &mut Vec<Destination>,
        depth: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(PdfError::Consistency("name tree too deep".to_string()));
        }
        let Some(dict) = node.as_dict() else {
            return Ok(());
        };
        if let Some(kids) = dict.get("Kids").and_then(Object::as_array) {
            for kid in kids {
                let kid = self.table.resolve(kid)?.clone();
                self.collect_name_tree(&kid, out, depth + 1, sink)?;
            }
        }
        if let Some(pairs) = dict.get("Names").and_then(Object::as_array) {
            for pair in pairs.chunks_exact(2) {
                let title = match self.table.resolve(&pair[0])? {
                    Object::String(s) => s.clone(),
                    Object::Name(n) => PdfString::text(n.as_str()),
                    _ => {
                        sink.warning("named destination key is neither string nor name");
                        continue;
                    }
                };
                self.push_named_dest(title, &pair[1], out, sink)?;
            }
        }
        Ok(())
    }

    fn push_named_dest(
        &self,
        title: PdfString,
        value: &Object,
        out: &mut Vec<Destination>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        let resolved = self.table.resolve(value)?;
        let array = match resolved {
            Object::Array(a) => Some(a.as_slice()),
            Object::Dictionary(d) => d.get("D").and_then(Object::as_array),
            _ => None,
        };
        match array.map(|a| Destination::from_array(title, a)) {
            Some(Ok(dest)) => out.push(dest),
            Some(Err(e)) => sink.warning(&format!("skipping malformed named destination: {e}")),
            None => sink.warning("skipping named destination without a destination array"),
        }
        Ok(())
    }
}

fn ascii_number(digits: &[u8]) -> u64 {
    // the pattern guarantees ASCII digits
    digits
        .iter()
        .fold(0u64, |acc, &d| acc.wrapping_mul(10) + (d - b'0') as u64)
}

fn find_catalog(
    bytes: &[u8],
    table: &ObjectTable,
    strict: bool,
    sink: &mut dyn DiagnosticSink,
    resolver: &mut SpanResolver,
) -> Result<ObjRef> {
    // the last trailer in the file governs
    let trailer_at = bytes
        .windows(7)
        .rposition(|w| w == b"trailer")
        .ok_or_else(|| PdfError::Consistency("trailer not found".to_string()))?;
    let mut cur = Cursor::new(bytes);
    cur.seek(SeekFrom::Start((trailer_at + 7) as u64))?;
    let trailer = {
        let mut cx = ReadContext {
            doc: table.document_id(),
            strict,
            sink,
            resolver: Some(resolver),
        };
        read_object(&mut cur, &mut cx)?
    };
    match trailer.as_dict().and_then(|d| d.get("Root")) {
        Some(Object::Reference(root)) => Ok(*root),
        _ => Err(PdfError::Consistency(
            "trailer has no /Root reference".to_string(),
        )),
    }
}

fn collect_pages(
    table: &ObjectTable,
    node: ObjRef,
    out: &mut Vec<ObjRef>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_RESOLVE_DEPTH {
        return Err(PdfError::Consistency("page tree too deep".to_string()));
    }
    let dict = table.resolve_dict(node)?;
    match dict.type_name() {
        Some("Page") => {
            out.push(node);
            Ok(())
        }
        Some("Pages") => {
            let kids = dict
                .get("Kids")
                .and_then(Object::as_array)
                .ok_or_else(|| {
                    PdfError::Consistency(format!("pages node {node} has no /Kids array"))
                })?;
            for kid in kids {
                match kid.as_reference() {
                    Some(r) => collect_pages(table, r, out, depth + 1)?,
                    None => {
                        return Err(PdfError::Consistency(
                            "page tree kid is not a reference".to_string(),
                        ))
                    }
                }
            }
            Ok(())
        }
        other => Err(PdfError::Consistency(format!(
            "unexpected node type {other:?} in page tree"
        ))),
    }
}

/// Resolves references by parsing their span on demand. Used while the
/// table is still being filled, for indirect `/Length` values.
struct SpanResolver<'d> {
    data: &'d [u8],
    spans: &'d HashMap<(u64, u32), u64>,
    doc: DocumentId,
    strict: bool,
    depth: usize,
}

impl Resolver for SpanResolver<'_> {
    fn resolve(&mut self, r: ObjRef, sink: &mut dyn DiagnosticSink) -> Result<Object> {
        if self.depth >= MAX_RESOLVE_DEPTH {
            return Err(PdfError::ResolutionDepth(r.id, r.gen));
        }
        let &offset = self.spans.get(&(r.id, r.gen)).ok_or_else(|| {
            PdfError::Consistency(format!("object {r} does not exist"))
        })?;
        self.depth += 1;
        let mut cur = Cursor::new(self.data);
        let result = cur
            .seek(SeekFrom::Start(offset))
            .map_err(PdfError::from)
            .and_then(|_| {
                let mut nested = SpanResolver {
                    data: self.data,
                    spans: self.spans,
                    doc: self.doc,
                    strict: self.strict,
                    depth: self.depth,
                };
                let mut cx = ReadContext {
                    doc: self.doc,
                    strict: self.strict,
                    sink,
                    resolver: Some(&mut nested),
                };
                read_object(&mut cur, &mut cx)
            });
        self.depth -= 1;
        result
    }
}
