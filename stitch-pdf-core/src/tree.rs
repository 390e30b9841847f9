//! Doubly-linked sibling trees (`/First /Last /Next /Prev /Parent /Count`).
//!
//! Outline hierarchies and name trees keep their children in this shape.
//! All operations address nodes by reference into an [`ObjectTable`] and
//! keep `/Count` equal to the number of direct children.

use crate::document::ObjectTable;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, ObjRef, Object};

fn node<'t>(table: &'t ObjectTable, r: ObjRef) -> Result<&'t Dictionary> {
    match table.get(r)? {
        Object::Dictionary(d) => Ok(d),
        _ => Err(PdfError::Consistency(format!(
            "tree node {r} is not a dictionary"
        ))),
    }
}

fn node_mut<'t>(table: &'t mut ObjectTable, r: ObjRef) -> Result<&'t mut Dictionary> {
    match table.get_mut(r)? {
        Object::Dictionary(d) => Ok(d),
        _ => Err(PdfError::Consistency(format!(
            "tree node {r} is not a dictionary"
        ))),
    }
}

fn link(table: &ObjectTable, r: ObjRef, key: &str) -> Result<Option<ObjRef>> {
    Ok(node(table, r)?.get(key).and_then(Object::as_reference))
}

fn count(table: &ObjectTable, r: ObjRef) -> Result<i64> {
    Ok(node(table, r)?
        .get("Count")
        .and_then(Object::as_integer)
        .unwrap_or(0))
}

/// Direct children, first to last.
pub fn children(table: &ObjectTable, parent: ObjRef) -> Result<Vec<ObjRef>> {
    let mut out = Vec::new();
    let mut cur = link(table, parent, "First")?;
    let budget = table.len() + 1;
    while let Some(r) = cur {
        if out.len() >= budget {
            return Err(PdfError::Consistency(format!(
                "sibling cycle in tree under {parent}"
            )));
        }
        out.push(r);
        cur = link(table, r, "Next")?;
    }
    Ok(out)
}

/// Appends `child` to the tail of `parent`'s child list.
pub fn add_child(table: &mut ObjectTable, parent: ObjRef, child: ObjRef) -> Result<()> {
    let prev = if node(table, parent)?.contains_key("First") {
        link(table, parent, "Last")?
    } else {
        let p = node_mut(table, parent)?;
        p.set("First", child);
        p.set("Count", 0i64);
        None
    };
    let new_count = count(table, parent)? + 1;
    {
        let p = node_mut(table, parent)?;
        p.set("Last", child);
        p.set("Count", new_count);
    }
    if let Some(prev) = prev {
        node_mut(table, prev)?.set("Next", child);
        node_mut(table, child)?.set("Prev", prev);
    }
    node_mut(table, child)?.set("Parent", parent);
    Ok(())
}

/// Unlinks `child` from `parent`, relinking its neighbors and clearing the
/// child's tree keys.
pub fn remove_child(table: &mut ObjectTable, parent: ObjRef, child: ObjRef) -> Result<()> {
    match node(table, child)?.get("Parent").and_then(Object::as_reference) {
        Some(p) if p == parent => {}
        Some(_) => {
            return Err(PdfError::Consistency(
                "removed child is not a member of this tree".to_string(),
            ))
        }
        None => {
            return Err(PdfError::Consistency(
                "removed child does not appear to be a tree node".to_string(),
            ))
        }
    }

    let mut found = false;
    let mut prev: Option<ObjRef> = None;
    let mut cur = link(table, parent, "First")?;
    let budget = table.len() + 1;
    let mut steps = 0usize;
    while let Some(cur_ref) = cur {
        steps += 1;
        if steps > budget {
            return Err(PdfError::Consistency(format!(
                "sibling cycle in tree under {parent}"
            )));
        }
        if cur_ref == child {
            let next = link(table, child, "Next")?;
            match (prev, next) {
                (None, Some(next)) => {
                    // removing the first of several
                    node_mut(table, next)?.remove("Prev");
                    let p = node_mut(table, parent)?;
                    p.set("First", next);
                    decrement_count(table, parent)?;
                }
                (None, None) => {
                    // removing the only child
                    let p = node_mut(table, parent)?;
                    p.remove("Count");
                    p.remove("First");
                    p.remove("Last");
                }
                (Some(prev), Some(next)) => {
                    node_mut(table, next)?.set("Prev", prev);
                    node_mut(table, prev)?.set("Next", next);
                    decrement_count(table, parent)?;
                }
                (Some(prev), None) => {
                    // removing the last of several
                    node_mut(table, prev)?.remove("Next");
                    let p = node_mut(table, parent)?;
                    p.set("Last", prev);
                    decrement_count(table, parent)?;
                }
            }
            found = true;
            break;
        }
        prev = Some(cur_ref);
        cur = link(table, cur_ref, "Next")?;
    }
    if !found {
        return Err(PdfError::Consistency(
            "removal couldn't find item in tree".to_string(),
        ));
    }

    let c = node_mut(table, child)?;
    c.remove("Parent");
    c.remove("Next");
    c.remove("Prev");
    Ok(())
}

/// Detaches every child and clears the node's own child keys.
pub fn empty_tree(table: &mut ObjectTable, parent: ObjRef) -> Result<()> {
    for child in children(table, parent)? {
        let c = node_mut(table, child)?;
        c.remove("Parent");
        c.remove("Next");
        c.remove("Prev");
    }
    let p = node_mut(table, parent)?;
    p.remove("Count");
    p.remove("First");
    p.remove("Last");
    Ok(())
}

fn decrement_count(table: &mut ObjectTable, parent: ObjRef) -> Result<()> {
    let n = count(table, parent)? - 1;
    node_mut(table, parent)?.set("Count", n);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_node(table: &mut ObjectTable, title: &str) -> ObjRef {
        let mut dict = Dictionary::new();
        dict.set("Title", Object::text(title));
        table.add(dict)
    }

    fn setup() -> (ObjectTable, ObjRef) {
        let mut table = ObjectTable::new();
        let root = table.add(Dictionary::new());
        (table, root)
    }

    #[test]
    fn test_add_children_keeps_invariants() {
        let (mut table, root) = setup();
        let a = new_node(&mut table, "a");
        let b = new_node(&mut table, "b");
        let c = new_node(&mut table, "c");
        for child in [a, b, c] {
            add_child(&mut table, root, child).unwrap();
        }

        assert_eq!(children(&table, root).unwrap(), vec![a, b, c]);
        assert_eq!(count(&table, root).unwrap(), 3);
        assert_eq!(link(&table, root, "First").unwrap(), Some(a));
        assert_eq!(link(&table, root, "Last").unwrap(), Some(c));
        assert_eq!(link(&table, b, "Prev").unwrap(), Some(a));
        assert_eq!(link(&table, b, "Next").unwrap(), Some(c));
        for child in [a, b, c] {
            assert_eq!(link(&table, child, "Parent").unwrap(), Some(root));
        }
    }

    #[test]
    fn test_remove_middle_child() {
        let (mut table, root) = setup();
        let a = new_node(&mut table, "a");
        let b = new_node(&mut table, "b");
        let c = new_node(&mut table, "c");
        for child in [a, b, c] {
            add_child(&mut table, root, child).unwrap();
        }

        remove_child(&mut table, root, b).unwrap();
        assert_eq!(children(&table, root).unwrap(), vec![a, c]);
        assert_eq!(count(&table, root).unwrap(), 2);
        assert_eq!(link(&table, a, "Next").unwrap(), Some(c));
        assert_eq!(link(&table, c, "Prev").unwrap(), Some(a));
        // the removed node's tree keys are gone
        let detached = node(&table, b).unwrap();
        assert!(!detached.contains_key("Parent"));
        assert!(!detached.contains_key("Prev"));
    }

    #[test]
    fn test_remove_first_and_last() {
        let (mut table, root) = setup();
        let a = new_node(&mut table, "a");
        let b = new_node(&mut table, "b");
        let c = new_node(&mut table, "c");
        for child in [a, b, c] {
            add_child(&mut table, root, child).unwrap();
        }

        remove_child(&mut table, root, a).unwrap();
        assert_eq!(link(&table, root, "First").unwrap(), Some(b));
        assert!(!node(&table, b).unwrap().contains_key("Prev"));

        remove_child(&mut table, root, c).unwrap();
        assert_eq!(link(&table, root, "Last").unwrap(), Some(b));
        assert_eq!(count(&table, root).unwrap(), 1);
    }

    #[test]
    fn test_remove_only_child_clears_parent_keys() {
        let (mut table, root) = setup();
        let a = new_node(&mut table, "a");
        add_child(&mut table, root, a).unwrap();
        remove_child(&mut table, root, a).unwrap();

        let p = node(&table, root).unwrap();
        assert!(!p.contains_key("First"));
        assert!(!p.contains_key("Last"));
        assert!(!p.contains_key("Count"));
        assert!(children(&table, root).unwrap().is_empty());
    }

    #[test]
    fn test_remove_non_member_fails() {
        let (mut table, root) = setup();
        let a = new_node(&mut table, "a");
        add_child(&mut table, root, a).unwrap();
        let other_root = table.add(Dictionary::new());
        let b = new_node(&mut table, "b");
        add_child(&mut table, other_root, b).unwrap();

        assert!(matches!(
            remove_child(&mut table, root, b).unwrap_err(),
            PdfError::Consistency(_)
        ));
        let orphan = new_node(&mut table, "orphan");
        assert!(matches!(
            remove_child(&mut table, root, orphan).unwrap_err(),
            PdfError::Consistency(_)
        ));
    }

    #[test]
    fn test_empty_tree() {
        let (mut table, root) = setup();
        let kids: Vec<ObjRef> = (0..4).map(|i| new_node(&mut table, &i.to_string())).collect();
        for &k in &kids {
            add_child(&mut table, root, k).unwrap();
        }
        empty_tree(&mut table, root).unwrap();
        assert!(children(&table, root).unwrap().is_empty());
        for &k in &kids {
            assert!(!node(&table, k).unwrap().contains_key("Parent"));
        }
        assert!(!node(&table, root).unwrap().contains_key("Count"));
    }
}
