//! The flat value context renderers keep next to a schema.

use serde_json::{Map, Value};

use crate::spec::{Field, FieldKind, Schema};

/// Field key to current value.
pub type Values = Map<String, Value>;

/// Context holding every `defaultValue` in the schema, sections included.
/// Array templates are instantiated per element and seed nothing here.
pub fn seed_defaults(schema: &Schema) -> Values {
    let mut values = Values::new();
    seed_into(&schema.fields, &mut values);
    values
}

fn seed_into(fields: &[Field], values: &mut Values) {
    for field in fields {
        if let Some(default) = &field.default_value
            && !default.is_null()
        {
            values.insert(field.key.clone(), default.clone());
        }
        if let FieldKind::Section { children } = &field.kind {
            seed_into(children, values);
        }
    }
}

/// Reads a JSON object into a context. Anything else yields `None`.
pub fn values_from_json(value: Value) -> Option<Values> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_reach_into_sections_but_not_templates() {
        let mut name = Field::new("n", "name", "Name", FieldKind::Text);
        name.default_value = Some(json!("Ava"));
        let mut item = Field::new("i", "item", "Item", FieldKind::Text);
        item.default_value = Some(json!("x"));
        let list = Field::new("l", "list", "List", FieldKind::Array { of: Box::new(item) });
        let section = Field::new(
            "s",
            "group",
            "Group",
            FieldKind::Section {
                children: vec![name, list],
            },
        );
        let values = seed_defaults(&Schema::with_fields(vec![section]));
        assert_eq!(json!(values), json!({"name": "Ava"}));
    }
}
