use crate::Values;
use crate::expr::evaluate_computed;
use crate::spec::{Field, FieldKind, Schema};

/// Returns `values` with every computed field resolved, in tree order.
///
/// Each expression sees the results of the computed fields before it. A
/// failing or `null` result leaves whatever value the key already had.
pub fn apply_computed(schema: &Schema, values: &Values) -> Values {
    let mut resolved = values.clone();
    apply_in(&schema.fields, &mut resolved);
    resolved
}

/// Resolves computed fields of `fields` and their sections into `values`.
/// Array templates are left to per-element scopes.
pub(crate) fn apply_in(fields: &[Field], values: &mut Values) {
    for field in fields {
        if let Some(value) = evaluate_computed(field.computed_expr(), values) {
            values.insert(field.key.clone(), value);
        }
        if let FieldKind::Section { children } = &field.kind {
            apply_in(children, values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn computed(id: &str, key: &str, expr: &str) -> Field {
        let mut field = Field::new(id, key, key, FieldKind::Number);
        field.computed = Some(expr.into());
        field
    }

    #[test]
    fn later_fields_see_earlier_results() {
        let schema = Schema::with_fields(vec![
            computed("a", "subtotal", "price * qty"),
            computed("b", "total", "subtotal + 5"),
        ]);
        let values = json!({"price": 3, "qty": 2}).as_object().cloned().unwrap();
        let resolved = apply_computed(&schema, &values);
        assert_eq!(resolved["subtotal"], json!(6));
        assert_eq!(resolved["total"], json!(11));
        assert!(!values.contains_key("total"));
    }

    #[test]
    fn failure_keeps_raw_value() {
        let schema = Schema::with_fields(vec![computed("a", "total", "price *")]);
        let values = json!({"total": 42}).as_object().cloned().unwrap();
        assert_eq!(apply_computed(&schema, &values)["total"], json!(42));
    }
}
