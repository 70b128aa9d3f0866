//! Constructors for new fields and fresh identities.

use uuid::Uuid;

use crate::spec::{Field, FieldKind, FieldType, SelectOption, ValidationRules};

/// Globally unique field id.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Human-readable key with a short random suffix, e.g. `text_3f9a`.
pub fn fresh_key(stem: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{stem}_{}", &suffix[..4])
}

/// Options every new select-like field starts with.
pub fn sample_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("one", "One"),
        SelectOption::new("two", "Two"),
        SelectOption::new("three", "Three"),
    ]
}

/// Creates a field of `field_type` with fresh identity and type-appropriate
/// defaults.
pub fn create_field(field_type: FieldType, label: impl Into<String>) -> Field {
    let kind = match field_type {
        FieldType::Text => FieldKind::Text,
        FieldType::Number => FieldKind::Number,
        FieldType::Date => FieldKind::Date,
        FieldType::Checkbox => FieldKind::Checkbox,
        FieldType::Select => FieldKind::Select {
            options: sample_options(),
        },
        FieldType::Multiselect => FieldKind::Multiselect {
            options: sample_options(),
        },
        FieldType::Radio => FieldKind::Radio {
            options: sample_options(),
        },
        FieldType::Section => FieldKind::Section {
            children: Vec::new(),
        },
        FieldType::Array => {
            let mut template = blank(FieldKind::Text, fresh_key("item"), "Item");
            template.placeholder = Some(String::new());
            FieldKind::Array {
                of: Box::new(template),
            }
        }
    };
    blank(kind, fresh_key(field_type.as_str()), label)
}

fn blank(kind: FieldKind, key: String, label: impl Into<String>) -> Field {
    let mut field = Field::new(fresh_id(), key, label, kind);
    field.placeholder = Some(String::new());
    field.validation = Some(ValidationRules::default());
    field
}

/// Gives `field` and every node it owns a fresh id and key, top-down.
pub fn regenerate_identity(field: &mut Field) {
    field.visit_mut(&mut |node| {
        node.id = fresh_id();
        node.key = fresh_key(node.field_type().as_str());
    });
}
