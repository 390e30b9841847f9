//! Arena of indirect objects for one document.

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, DocumentId, ObjRef, Object};

/// Longest reference chain [`ObjectTable::resolve`] will follow. A
/// well-formed document needs one hop; malformed files can chain or cycle.
pub const MAX_RESOLVE_DEPTH: usize = 100;

/// Owns every indirect object of a document, keyed by object number and
/// generation. References carry the table's [`DocumentId`], so a reference
/// can never be resolved against the wrong table.
#[derive(Debug)]
pub struct ObjectTable {
    doc: DocumentId,
    entries: HashMap<(u64, u32), Object>,
    next_id: u64,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        ObjectTable {
            doc: DocumentId::next(),
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn document_id(&self) -> DocumentId {
        self.doc
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `obj` under a fresh object number.
    pub fn add(&mut self, obj: impl Into<Object>) -> ObjRef {
        let r = self.reserve();
        self.entries.insert((r.id, r.gen), obj.into());
        r
    }

    /// Allocates a fresh object number holding null, to be filled in later.
    /// Breaks reference cycles when importing object graphs.
    pub fn reserve(&mut self) -> ObjRef {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert((id, 0), Object::Null);
        ObjRef {
            id,
            gen: 0,
            doc: self.doc,
        }
    }

    /// Stores `obj` under an explicit number, as when loading a file.
    pub fn insert(&mut self, r: ObjRef, obj: Object) -> Result<()> {
        self.check_doc(r)?;
        self.entries.insert((r.id, r.gen), obj);
        self.next_id = self.next_id.max(r.id + 1);
        Ok(())
    }

    pub fn get(&self, r: ObjRef) -> Result<&Object> {
        self.check_doc(r)?;
        self.entries.get(&(r.id, r.gen)).ok_or_else(|| {
            PdfError::Consistency(format!("object {r} does not exist"))
        })
    }

    pub fn get_mut(&mut self, r: ObjRef) -> Result<&mut Object> {
        self.check_doc(r)?;
        self.entries.get_mut(&(r.id, r.gen)).ok_or_else(|| {
            PdfError::Consistency(format!("object {r} does not exist"))
        })
    }

    /// Follows `obj` through reference indirections to a direct object.
    /// Resolving is idempotent and bounded by [`MAX_RESOLVE_DEPTH`].
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(r) => self.resolve_ref(*r),
            direct => Ok(direct),
        }
    }

    pub fn resolve_ref(&self, r: ObjRef) -> Result<&Object> {
        let mut current = r;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match self.get(current)? {
                Object::Reference(next) => current = *next,
                direct => return Ok(direct),
            }
        }
        Err(PdfError::ResolutionDepth(r.id, r.gen))
    }

    /// Resolves and requires a dictionary.
    pub fn resolve_dict(&self, r: ObjRef) -> Result<&Dictionary> {
        match self.resolve_ref(r)? {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(s.dict()),
            other => Err(PdfError::Consistency(format!(
                "object {r} is not a dictionary: {other:?}"
            ))),
        }
    }

    /// Object numbers present, in ascending order.
    pub fn ids(&self) -> Vec<(u64, u32)> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn check_doc(&self, r: ObjRef) -> Result<()> {
        if r.doc == self.doc {
            Ok(())
        } else {
            Err(PdfError::Consistency(format!(
                "reference {r} belongs to a different document"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_resolve() {
        let mut table = ObjectTable::new();
        let r = table.add(Object::Integer(7));
        assert_eq!(table.resolve_ref(r).unwrap(), &Object::Integer(7));
        // resolving twice yields the same slot
        assert_eq!(table.resolve_ref(r).unwrap(), &Object::Integer(7));
    }

    #[test]
    fn test_default_tables_are_independent() {
        let mut a = ObjectTable::default();
        let b = ObjectTable::default();
        assert_ne!(a.document_id(), b.document_id());
        assert_eq!(a.add(Object::Null).id, 1);
    }

    #[test]
    fn test_resolve_chain() {
        let mut table = ObjectTable::new();
        let a = table.add(Object::Integer(1));
        let b = table.add(Object::Reference(a));
        assert_eq!(table.resolve_ref(b).unwrap(), &Object::Integer(1));
    }

    #[test]
    fn test_resolve_cycle_bounded() {
        let mut table = ObjectTable::new();
        let a = table.reserve();
        let b = table.add(Object::Reference(a));
        table.insert(a, Object::Reference(b)).unwrap();
        assert!(matches!(
            table.resolve_ref(a).unwrap_err(),
            PdfError::ResolutionDepth(_, _)
        ));
    }

    #[test]
    fn test_direct_object_resolves_to_itself() {
        let table = ObjectTable::new();
        let obj = Object::Boolean(true);
        assert_eq!(table.resolve(&obj).unwrap(), &obj);
    }

    #[test]
    fn test_foreign_reference_rejected() {
        let mut a = ObjectTable::new();
        let mut b = ObjectTable::new();
        let r = b.add(Object::Null);
        assert!(matches!(
            a.get(r).unwrap_err(),
            PdfError::Consistency(_)
        ));
        let _ = a.add(Object::Null);
    }

    #[test]
    fn test_insert_bumps_allocator() {
        let mut table = ObjectTable::new();
        let doc = table.document_id();
        table
            .insert(ObjRef { id: 9, gen: 0, doc }, Object::Null)
            .unwrap();
        let fresh = table.add(Object::Null);
        assert_eq!(fresh.id, 10);
    }

    #[test]
    fn test_missing_object() {
        let table = ObjectTable::new();
        let r = ObjRef {
            id: 5,
            gen: 0,
            doc: table.document_id(),
        };
        assert!(matches!(
            table.get(r).unwrap_err(),
            PdfError::Consistency(_)
        ));
    }
}
