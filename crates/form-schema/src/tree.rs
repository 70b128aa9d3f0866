//! Pure traversal primitives over an ordered list of fields.
//!
//! Every function here leaves its input untouched and returns a new list.
//! Only section children are descended into; array templates are owned by
//! their array and are not addressable as tree positions.

use crate::spec::{Field, FieldKind};

/// Depth-first preorder search. First match wins.
pub fn find_by_id<'a>(fields: &'a [Field], id: &str) -> Option<&'a Field> {
    for field in fields {
        if field.id == id {
            return Some(field);
        }
        if let Some(children) = field.children()
            && let Some(hit) = find_by_id(children, id)
        {
            return Some(hit);
        }
    }
    None
}

/// Applies `f` to every field, children before their section, and rebuilds
/// the tree from the results.
pub fn map_all(fields: &[Field], f: &mut dyn FnMut(Field) -> Field) -> Vec<Field> {
    fields
        .iter()
        .map(|field| {
            let mut next = field.clone();
            if let FieldKind::Section { children } = &field.kind {
                next.kind = FieldKind::Section {
                    children: map_all(children, f),
                };
            }
            f(next)
        })
        .collect()
}

/// Drops the field with `id` (and everything it owns) from whichever
/// container holds it. Siblings keep their relative order.
pub fn remove_by_id(fields: &[Field], id: &str) -> Vec<Field> {
    fields
        .iter()
        .filter(|field| field.id != id)
        .map(|field| {
            let mut next = field.clone();
            if let FieldKind::Section { children } = &field.kind {
                next.kind = FieldKind::Section {
                    children: remove_by_id(children, id),
                };
            }
            next
        })
        .collect()
}

/// Appends `child` to the section named `parent_id`. Returns the tree
/// unchanged when no such section exists.
pub fn insert_child(fields: &[Field], parent_id: &str, child: Field) -> Vec<Field> {
    let mut pending = Some(child);
    map_all(fields, &mut |mut field| {
        if field.id == parent_id
            && let Some(children) = field.children_mut()
            && let Some(child) = pending.take()
        {
            children.push(child);
        }
        field
    })
}

/// Moves the element at `from` to `to`.
///
/// # Panics
///
/// Panics when either index is out of bounds. Callers check ranges first.
pub fn reorder_within<T: Clone>(siblings: &[T], from: usize, to: usize) -> Vec<T> {
    assert!(
        from < siblings.len() && to < siblings.len(),
        "reorder indices {from} -> {to} out of bounds for {} siblings",
        siblings.len()
    );
    let mut next = siblings.to_vec();
    if from != to {
        let item = next.remove(from);
        next.insert(to, item);
    }
    next
}

/// Whether `id` names `root` or one of its owned descendants.
pub fn subtree_contains(root: &Field, id: &str) -> bool {
    let mut found = false;
    root.visit(&mut |field| found |= field.id == id);
    found
}

/// Every id in the tree, array templates included, in preorder.
pub fn all_ids(fields: &[Field]) -> Vec<&str> {
    let mut ids = Vec::new();
    for field in fields {
        field.visit(&mut |node| ids.push(node.id.as_str()));
    }
    ids
}
