//! Assembling and serializing an output document.
//!
//! [`PdfWriter`] owns a fresh [`ObjectTable`] holding a catalog and an empty
//! page tree. Pages are copied over from source documents one at a time;
//! every object reachable from a copied page comes with it, renumbered into
//! the output table. The import map remembers what has already been copied,
//! so objects shared between pages are written once and reference cycles
//! terminate.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::destination::Destination;
use crate::document::ObjectTable;
use crate::error::{PdfError, Result};
use crate::objects::{write_object, Dictionary, Name, ObjRef, Object, PdfString};
use crate::tree;

pub struct PdfWriter {
    table: ObjectTable,
    catalog: ObjRef,
    pages_root: ObjRef,
    outline_root: Option<ObjRef>,
    named_dests: Vec<(PdfString, ObjRef)>,
    imported: HashMap<ObjRef, ObjRef>,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut table = ObjectTable::new();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::name("Pages"));
        pages.set("Kids", Vec::<Object>::new());
        pages.set("Count", 0i64);
        let pages_root = table.add(pages);
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::name("Catalog"));
        catalog.set("Pages", pages_root);
        let catalog = table.add(catalog);
        PdfWriter {
            table,
            catalog,
            pages_root,
            outline_root: None,
            named_dests: Vec::new(),
            imported: HashMap::new(),
        }
    }

    pub fn table(&self) -> &ObjectTable {
        &self.table
    }

    /// Copies `page` and everything reachable from it out of `source`,
    /// appends it to the page tree, and returns its reference in the output
    /// document.
    pub fn add_page(&mut self, source: &ObjectTable, page: ObjRef) -> Result<ObjRef> {
        let out = self.import_ref(source, page)?;
        match self.table.get_mut(out)?.as_dict_mut() {
            Some(d) if d.type_name() == Some("Page") => d.set("Parent", self.pages_root),
            _ => {
                return Err(PdfError::Consistency(format!(
                    "added page {page} is not a /Page dictionary"
                )))
            }
        }
        let pages = self.pages_mut()?;
        match pages.get_mut("Kids") {
            Some(Object::Array(kids)) => kids.push(out.into()),
            _ => {
                return Err(PdfError::Consistency(
                    "page tree root has no /Kids array".to_string(),
                ))
            }
        }
        let count = pages.get("Count").and_then(Object::as_integer).unwrap_or(0);
        pages.set("Count", count + 1);
        Ok(out)
    }

    /// The outline root, created on first use and linked into the catalog.
    pub fn outline_root(&mut self) -> Result<ObjRef> {
        if let Some(root) = self.outline_root {
            return Ok(root);
        }
        let mut outlines = Dictionary::new();
        outlines.set("Type", Object::name("Outlines"));
        let root = self.table.add(outlines);
        self.catalog_mut()?.set("Outlines", root);
        self.outline_root = Some(root);
        Ok(root)
    }

    /// Appends a bookmark node under `parent` (the outline root when
    /// `None`). Tree linkage entries in `node` are overwritten.
    pub fn add_bookmark_dict(
        &mut self,
        node: Dictionary,
        parent: Option<ObjRef>,
    ) -> Result<ObjRef> {
        let root = self.outline_root()?;
        let parent = parent.unwrap_or(root);
        let child = self.table.add(node);
        tree::add_child(&mut self.table, parent, child)?;
        Ok(child)
    }

    pub fn add_bookmark(
        &mut self,
        dest: &Destination,
        parent: Option<ObjRef>,
    ) -> Result<ObjRef> {
        let mut node = Dictionary::new();
        if let Some(title) = dest.title() {
            node.set("Title", title.clone());
        }
        node.set("Dest", dest.dest_array());
        self.add_bookmark_dict(node, parent)
    }

    /// Registers `value` under `title` in the output's destination name
    /// tree.
    pub fn add_named_destination(
        &mut self,
        title: PdfString,
        value: impl Into<Object>,
    ) -> Result<ObjRef> {
        let r = self.table.add(value);
        self.named_dests.push((title, r));
        Ok(r)
    }

    /// Serializes the document. Finalizes the destination name tree, so the
    /// writer should not be modified afterwards.
    pub fn write_to<W: Write>(&mut self, w: &mut W) -> Result<()> {
        self.finish_named_dests()?;

        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(b"%PDF-1.3\n%\xe2\xe3\xcf\xd3\n");

        let ids = self.table.ids();
        let mut offsets: Vec<(u64, u32, usize)> = Vec::with_capacity(ids.len());
        for (id, gen) in ids {
            offsets.push((id, gen, buf.len()));
            buf.extend_from_slice(format!("{id} {gen} obj\n").as_bytes());
            let obj = self.table.get(ObjRef {
                id,
                gen,
                doc: self.table.document_id(),
            })?;
            write_object(&mut buf, obj, None)?;
            buf.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = buf.len();
        buf.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for (_, gen, offset) in &offsets {
            buf.extend_from_slice(format!("{offset:010} {gen:05} n \n").as_bytes());
        }

        let mut trailer = Dictionary::new();
        trailer.set("Size", (offsets.len() + 1) as i64);
        trailer.set("Root", self.catalog);
        buf.extend_from_slice(b"trailer\n");
        write_object(&mut buf, &Object::Dictionary(trailer), None)?;
        buf.extend_from_slice(format!("\nstartxref\n{xref_at}\n%%EOF\n").as_bytes());

        w.write_all(&buf)?;
        Ok(())
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    fn import_ref(&mut self, source: &ObjectTable, r: ObjRef) -> Result<ObjRef> {
        if let Some(&out) = self.imported.get(&r) {
            return Ok(out);
        }
        // reserve first so cycles resolve to the placeholder
        let out = self.table.reserve();
        self.imported.insert(r, out);
        let mut obj = source.get(r)?.clone();
        if let Object::Dictionary(d) = &mut obj {
            // pages are re-parented by add_page; a copied /Parent would
            // drag in the source's whole page tree
            if d.type_name() == Some("Page") {
                d.remove("Parent");
            }
        }
        self.import_value(source, &mut obj)?;
        *self.table.get_mut(out)? = obj;
        Ok(out)
    }

    fn import_value(&mut self, source: &ObjectTable, obj: &mut Object) -> Result<()> {
        match obj {
            Object::Reference(r) => *r = self.import_ref(source, *r)?,
            Object::Array(items) => {
                for item in items {
                    self.import_value(source, item)?;
                }
            }
            Object::Dictionary(dict) => self.import_dict(source, dict)?,
            Object::Stream(stream) => self.import_dict(source, stream.dict_mut())?,
            _ => {}
        }
        Ok(())
    }

    fn import_dict(&mut self, source: &ObjectTable, dict: &mut Dictionary) -> Result<()> {
        let keys: Vec<Name> = dict.iter().map(|(k, _)| k.clone()).collect();
        for key in keys {
            if let Some(value) = dict.get_mut(key.as_str()) {
                self.import_value(source, value)?;
            }
        }
        Ok(())
    }

    fn finish_named_dests(&mut self) -> Result<()> {
        if self.named_dests.is_empty() {
            return Ok(());
        }
        let mut entries = std::mem::take(&mut self.named_dests);
        entries.sort_by(|a, b| a.0.output_bytes().cmp(&b.0.output_bytes()));
        let mut flat: Vec<Object> = Vec::with_capacity(entries.len() * 2);
        for (title, r) in entries {
            flat.push(Object::String(title));
            flat.push(r.into());
        }
        let mut leaf = Dictionary::new();
        leaf.set("Names", flat);
        let leaf = self.table.add(leaf);
        let mut names = Dictionary::new();
        names.set("Dests", leaf);
        self.catalog_mut()?.set("Names", names);
        Ok(())
    }

    fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        self.table
            .get_mut(self.catalog)?
            .as_dict_mut()
            .ok_or_else(|| PdfError::Consistency("catalog is not a dictionary".to_string()))
    }

    fn pages_mut(&mut self) -> Result<&mut Dictionary> {
        self.table
            .get_mut(self.pages_root)?
            .as_dict_mut()
            .ok_or_else(|| {
                PdfError::Consistency("page tree root is not a dictionary".to_string())
            })
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
