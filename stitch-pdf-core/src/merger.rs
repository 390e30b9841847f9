//! Combining page ranges from several documents into one output.
//!
//! The merger is a two-phase pipeline. `merge`/`append` ingest a source:
//! pages in the requested range get sequential local ids, the source's
//! outline and named destinations are trimmed to the kept pages, and every
//! surviving destination is re-targeted from a source page reference to the
//! local id of that page. `write` then copies the pages into a fresh
//! [`PdfWriter`] in their final order and rewrites each local id to the
//! reference the page received in the output.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::destination::{Destination, FitType};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, ObjRef, Object, PdfString};
use crate::source::{OutlineNode, SourceDocument};
use crate::writer::PdfWriter;

/// A document to merge: a file on disk, an in-memory buffer, or an already
/// parsed [`SourceDocument`].
pub enum MergeInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Document(SourceDocument),
}

impl MergeInput {
    fn load(self, strict: bool, sink: &mut dyn DiagnosticSink) -> Result<SourceDocument> {
        match self {
            MergeInput::Path(path) => SourceDocument::open(path, strict, sink),
            MergeInput::Bytes(bytes) => SourceDocument::from_bytes(&bytes, strict, sink),
            MergeInput::Document(doc) => Ok(doc),
        }
    }
}

impl From<PathBuf> for MergeInput {
    fn from(path: PathBuf) -> Self {
        MergeInput::Path(path)
    }
}

impl From<&Path> for MergeInput {
    fn from(path: &Path) -> Self {
        MergeInput::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for MergeInput {
    fn from(bytes: Vec<u8>) -> Self {
        MergeInput::Bytes(bytes)
    }
}

impl From<SourceDocument> for MergeInput {
    fn from(doc: SourceDocument) -> Self {
        MergeInput::Document(doc)
    }
}

/// Per-merge settings.
pub struct MergeOptions {
    /// Title for a bookmark covering the merged batch as a whole.
    pub bookmark: Option<String>,
    /// Page range to take from the source. The whole document when `None`.
    pub pages: Option<Range<usize>>,
    /// Whether the source's own outline is carried over.
    pub import_bookmarks: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            bookmark: None,
            pages: None,
            import_bookmarks: true,
        }
    }
}

/// A page scheduled for the output. `local_id` is its position-independent
/// identity; destinations point at it until `write` assigns real references.
struct MergedPage {
    local_id: i64,
    input: usize,
    page: ObjRef,
}

pub struct PdfMerger {
    strict: bool,
    sink: Box<dyn DiagnosticSink>,
    inputs: Vec<SourceDocument>,
    pages: Vec<MergedPage>,
    outline: Vec<OutlineNode>,
    named_dests: Vec<Destination>,
    next_local_id: i64,
}

impl PdfMerger {
    pub fn new(strict: bool) -> Self {
        Self::with_sink(strict, Box::new(TracingSink))
    }

    pub fn with_sink(strict: bool, sink: Box<dyn DiagnosticSink>) -> Self {
        PdfMerger {
            strict,
            sink,
            inputs: Vec::new(),
            pages: Vec::new(),
            outline: Vec::new(),
            named_dests: Vec::new(),
            next_local_id: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Merges a source at the end of the current page sequence.
    pub fn append(&mut self, input: impl Into<MergeInput>, options: MergeOptions) -> Result<()> {
        self.merge(self.pages.len(), input, options)
    }

    /// Splices a source's pages in at `position`. Outline entries and named
    /// destinations are accumulated in merge order regardless of position.
    pub fn merge(
        &mut self,
        position: usize,
        input: impl Into<MergeInput>,
        options: MergeOptions,
    ) -> Result<()> {
        if position > self.pages.len() {
            return Err(PdfError::Consistency(format!(
                "insert position {position} is beyond the last page ({})",
                self.pages.len()
            )));
        }
        let doc = input.into().load(self.strict, &mut *self.sink)?;
        let range = options.pages.unwrap_or(0..doc.page_count());
        if range.start > range.end || range.end > doc.page_count() {
            return Err(PdfError::Consistency(format!(
                "page range {}..{} is out of bounds ({} pages)",
                range.start,
                range.end,
                doc.page_count()
            )));
        }

        let first_local = self.next_local_id;
        let input_index = self.inputs.len();
        let mut batch = Vec::with_capacity(range.len());
        let mut kept = HashSet::new();
        for i in range {
            let page = doc.page(i)?;
            kept.insert(page);
            batch.push(MergedPage {
                local_id: self.next_local_id,
                input: input_index,
                page,
            });
            self.next_local_id += 1;
        }

        let mut outline = if options.import_bookmarks {
            trim_outline(doc.outline(&mut *self.sink)?, &kept)
        } else {
            Vec::new()
        };
        bind_outline(&mut outline, &batch)?;

        let mut dests: Vec<Destination> = doc
            .named_destinations(&mut *self.sink)?
            .into_iter()
            .filter(|d| match d.page().and_then(Object::as_reference) {
                Some(p) => kept.contains(&p),
                None => false,
            })
            .collect();
        for dest in &mut dests {
            bind_destination(dest, &batch)?;
        }

        if let Some(title) = options.bookmark {
            let header = Destination::new(
                PdfString::text(title.as_str()),
                Object::Integer(first_local),
                FitType::Fit,
                vec![],
            )?;
            let nested = std::mem::take(&mut outline);
            outline.push(OutlineNode::Item(header));
            if !nested.is_empty() {
                outline.push(OutlineNode::Group(nested));
            }
        }

        self.outline.extend(outline);
        self.named_dests.extend(dests);
        self.inputs.push(doc);
        self.pages.splice(position..position, batch);
        Ok(())
    }

    /// Copies all scheduled pages into a fresh output document and writes
    /// it out.
    pub fn write_to<W: Write>(&mut self, w: &mut W) -> Result<()> {
        let mut writer = PdfWriter::new();
        let mut locals: HashMap<i64, ObjRef> = HashMap::new();
        for mp in &self.pages {
            let table = self.inputs[mp.input].table();
            let out = writer.add_page(table, mp.page)?;
            locals.insert(mp.local_id, out);
        }
        self.write_dests(&mut writer, &locals)?;
        write_outline_level(
            &mut writer,
            &mut *self.sink,
            &self.outline,
            None,
            &locals,
        )?;
        writer.write_to(w)
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Drops all accumulated state, releasing the source documents.
    pub fn close(&mut self) {
        self.inputs.clear();
        self.pages.clear();
        self.outline.clear();
        self.named_dests.clear();
        self.next_local_id = 0;
    }

    fn write_dests(
        &mut self,
        writer: &mut PdfWriter,
        locals: &HashMap<i64, ObjRef>,
    ) -> Result<()> {
        for dest in &self.named_dests {
            let out = dest
                .page()
                .and_then(Object::as_integer)
                .and_then(|local| locals.get(&local).copied());
            let Some(out) = out else {
                self.sink
                    .warning("skipping named destination without a written page");
                continue;
            };
            let mut array = dest.dest_array();
            array[0] = out.into();
            let mut value = Dictionary::new();
            value.set("D", array);
            value.set("S", Object::name("GoTo"));
            let title = dest
                .title()
                .cloned()
                .unwrap_or_else(|| PdfString::text(""));
            writer.add_named_destination(title, value)?;
        }
        Ok(())
    }
}

/// Drops outline entries whose page is not in the kept set. A group with
/// survivors keeps its heading item even when the heading's own page was
/// dropped; the heading is re-attached before the group and the bind phase
/// reports it by title. A group whose entries all dropped disappears with
/// its heading.
fn trim_outline(outline: Vec<OutlineNode>, kept: &HashSet<ObjRef>) -> Vec<OutlineNode> {
    let mut out = Vec::new();
    let mut dropped_header: Option<Destination> = None;
    for node in outline {
        match node {
            OutlineNode::Group(sub) => {
                let sub = trim_outline(sub, kept);
                if !sub.is_empty() {
                    if let Some(header) = dropped_header.take() {
                        out.push(OutlineNode::Item(header));
                    }
                    out.push(OutlineNode::Group(sub));
                }
                // a heading covers only the group right after it
                dropped_header = None;
            }
            OutlineNode::Item(dest) => {
                match dest.page().and_then(Object::as_reference) {
                    Some(p) if kept.contains(&p) => {
                        out.push(OutlineNode::Item(dest));
                        dropped_header = None;
                    }
                    _ => dropped_header = Some(dest),
                }
            }
        }
    }
    out
}

/// Replaces source page references with local ids. Entries already bound
/// to an id pass through.
fn bind_outline(nodes: &mut [OutlineNode], batch: &[MergedPage]) -> Result<()> {
    for node in nodes {
        match node {
            OutlineNode::Group(sub) => bind_outline(sub, batch)?,
            OutlineNode::Item(dest) => bind_destination(dest, batch)?,
        }
    }
    Ok(())
}

fn bind_destination(dest: &mut Destination, batch: &[MergedPage]) -> Result<()> {
    let page = dest.page().cloned();
    match page {
        Some(Object::Integer(_)) => Ok(()),
        Some(Object::Reference(r)) => match batch.iter().find(|mp| mp.page == r) {
            Some(mp) => {
                dest.set_page(mp.local_id);
                Ok(())
            }
            None => Err(PdfError::Consistency(format!(
                "unresolved destination '{}'",
                dest.title().and_then(PdfString::as_text).unwrap_or("")
            ))),
        },
        _ => Err(PdfError::Consistency(format!(
            "destination '{}' has no page",
            dest.title().and_then(PdfString::as_text).unwrap_or("")
        ))),
    }
}

/// Emits one outline level. A group becomes the children of the item
/// written just before it.
fn write_outline_level(
    writer: &mut PdfWriter,
    sink: &mut dyn DiagnosticSink,
    nodes: &[OutlineNode],
    parent: Option<ObjRef>,
    locals: &HashMap<i64, ObjRef>,
) -> Result<()> {
    let mut last: Option<ObjRef> = None;
    for node in nodes {
        match node {
            OutlineNode::Group(sub) => {
                write_outline_level(writer, sink, sub, last.or(parent), locals)?;
            }
            OutlineNode::Item(dest) => {
                let out = dest
                    .page()
                    .and_then(Object::as_integer)
                    .and_then(|local| locals.get(&local).copied());
                let Some(out) = out else {
                    sink.warning("skipping bookmark without a written page");
                    continue;
                };
                let node_dict = bookmark_node(dest, out)?;
                last = Some(writer.add_bookmark_dict(node_dict, parent)?);
            }
        }
    }
    Ok(())
}

/// The bookmark dictionary for `dest`, navigating via a `/GoTo` action on
/// the output page. Coordinate fields move into the action's argument
/// list; absent or null fields become zero.
fn bookmark_node(dest: &Destination, out: ObjRef) -> Result<Dictionary> {
    let fit = dest.fit()?;
    let mut dict = dest.dict().clone();
    dict.remove("Page");
    dict.remove("Type");
    let mut args: Vec<Object> = vec![out.into(), Object::name(fit.pdf_name())];
    for field in fit.field_names() {
        match dict.remove(field) {
            Some(Object::Null) | None => args.push(Object::from(0.0)),
            Some(value) => args.push(value),
        }
    }
    let mut action = Dictionary::new();
    action.set("S", Object::name("GoTo"));
    action.set("D", args);
    dict.set("A", action);
    Ok(dict)
}
