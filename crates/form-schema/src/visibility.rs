use std::collections::BTreeMap;

use crate::Values;
use crate::expr::evaluate_visibility;
use crate::spec::{Field, FieldKind, Schema};

/// Visibility per field id.
pub type VisibilityMap = BTreeMap<String, bool>;

/// Evaluates every `visibleWhen` against `values`. A hidden section or
/// array hides everything it owns, whatever their own expressions say.
pub fn resolve_visibility(schema: &Schema, values: &Values) -> VisibilityMap {
    let mut map = VisibilityMap::new();
    resolve_into(&schema.fields, values, true, &mut map);
    map
}

fn resolve_into(fields: &[Field], values: &Values, parent_visible: bool, map: &mut VisibilityMap) {
    for field in fields {
        let visible = parent_visible && evaluate_visibility(field.visibility_expr(), values);
        map.insert(field.id.clone(), visible);
        match &field.kind {
            FieldKind::Section { children } => resolve_into(children, values, visible, map),
            FieldKind::Array { of } => {
                resolve_into(std::slice::from_ref(of.as_ref()), values, visible, map)
            }
            _ => {}
        }
    }
}

/// Unknown ids count as visible.
pub fn is_visible(map: &VisibilityMap, id: &str) -> bool {
    map.get(id).copied().unwrap_or(true)
}
