use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Type tags a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Checkbox,
    Select,
    Multiselect,
    Radio,
    Section,
    Array,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Date,
        FieldType::Checkbox,
        FieldType::Select,
        FieldType::Multiselect,
        FieldType::Radio,
        FieldType::Section,
        FieldType::Array,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Radio => "radio",
            FieldType::Section => "section",
            FieldType::Array => "array",
        }
    }

    /// Label a freshly created field of this type starts with.
    pub fn palette_label(self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Date => "Date",
            FieldType::Checkbox => "Checkbox",
            FieldType::Select => "Select",
            FieldType::Multiselect => "Multi-select",
            FieldType::Radio => "Radio group",
            FieldType::Section => "Section",
            FieldType::Array => "Array",
        }
    }

    /// Whether fields of this type carry an options list.
    pub fn has_options(self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Multiselect | FieldType::Radio
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a type tag does not name a known field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let tag = raw.trim().to_ascii_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| UnknownFieldType(raw.to_string()))
    }
}

/// One entry of a select, multiselect or radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Constraint block shared by every field type.
///
/// `min`/`max` mean a numeric range for numbers, a character count for
/// text-like values and an entry count for multiselect and array values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.regex.is_none()
    }
}

/// Type-specific payload of a field. Serialized inline next to the common
/// base, discriminated by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Checkbox,
    Select { options: Vec<SelectOption> },
    Multiselect { options: Vec<SelectOption> },
    Radio { options: Vec<SelectOption> },
    Section { children: Vec<Field> },
    Array { of: Box<Field> },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text => FieldType::Text,
            FieldKind::Number => FieldType::Number,
            FieldKind::Date => FieldType::Date,
            FieldKind::Checkbox => FieldType::Checkbox,
            FieldKind::Select { .. } => FieldType::Select,
            FieldKind::Multiselect { .. } => FieldType::Multiselect,
            FieldKind::Radio { .. } => FieldType::Radio,
            FieldKind::Section { .. } => FieldType::Section,
            FieldKind::Array { .. } => FieldType::Array,
        }
    }
}

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub key: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// An explicit `null` default stays `Some(Value::Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<String>,
}

impl Field {
    /// Bare field with no optional attributes set.
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            kind,
            label: label.into(),
            placeholder: None,
            help_text: None,
            required: false,
            default_value: None,
            validation: None,
            visible_when: None,
            computed: None,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, FieldKind::Section { .. })
    }

    /// Children of a section, `None` for every other type.
    pub fn children(&self) -> Option<&[Field]> {
        match &self.kind {
            FieldKind::Section { children } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Field>> {
        match &mut self.kind {
            FieldKind::Section { children } => Some(children),
            _ => None,
        }
    }

    /// Template of an array field.
    pub fn template(&self) -> Option<&Field> {
        match &self.kind {
            FieldKind::Array { of } => Some(of),
            _ => None,
        }
    }

    pub fn options(&self) -> Option<&[SelectOption]> {
        match &self.kind {
            FieldKind::Select { options }
            | FieldKind::Multiselect { options }
            | FieldKind::Radio { options } => Some(options),
            _ => None,
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut Vec<SelectOption>> {
        match &mut self.kind {
            FieldKind::Select { options }
            | FieldKind::Multiselect { options }
            | FieldKind::Radio { options } => Some(options),
            _ => None,
        }
    }

    /// Trimmed visibility expression, `None` when absent or blank.
    pub fn visibility_expr(&self) -> Option<&str> {
        non_blank(self.visible_when.as_deref())
    }

    /// Trimmed computed expression, `None` when absent or blank.
    pub fn computed_expr(&self) -> Option<&str> {
        non_blank(self.computed.as_deref())
    }

    /// Computed fields are read-only for the user.
    pub fn is_computed(&self) -> bool {
        self.computed_expr().is_some()
    }

    pub fn rules(&self) -> Option<&ValidationRules> {
        self.validation.as_ref()
    }

    /// Visits this field and every owned descendant (section children and
    /// array templates) in preorder.
    pub fn visit<'a>(&'a self, visitor: &mut dyn FnMut(&'a Field)) {
        visitor(self);
        match &self.kind {
            FieldKind::Section { children } => {
                for child in children {
                    child.visit(visitor);
                }
            }
            FieldKind::Array { of } => of.visit(visitor),
            _ => {}
        }
    }

    /// Mutable counterpart of [`Field::visit`].
    pub fn visit_mut(&mut self, visitor: &mut dyn FnMut(&mut Field)) {
        visitor(self);
        match &mut self.kind {
            FieldKind::Section { children } => {
                for child in children {
                    child.visit_mut(visitor);
                }
            }
            FieldKind::Array { of } => of.visit_mut(visitor),
            _ => {}
        }
    }

    /// Ids of this field and all owned descendants.
    pub fn subtree_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.visit(&mut |field| ids.push(field.id.clone()));
        ids
    }
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_parses_case_insensitively() {
        assert_eq!("Section".parse::<FieldType>(), Ok(FieldType::Section));
        assert_eq!(" multiselect ".parse::<FieldType>(), Ok(FieldType::Multiselect));
        assert!("textarea".parse::<FieldType>().is_err());
    }

    #[test]
    fn select_field_serializes_inline() {
        let field = Field::new(
            "f1",
            "color",
            "Color",
            FieldKind::Select {
                options: vec![SelectOption::new("red", "Red")],
            },
        );
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "f1",
                "key": "color",
                "type": "select",
                "options": [{ "value": "red", "label": "Red" }],
                "label": "Color"
            })
        );
    }

    #[test]
    fn nested_kinds_deserialize() {
        let raw = json!({
            "id": "s1",
            "key": "contact",
            "type": "section",
            "label": "Contact",
            "children": [{
                "id": "a1",
                "key": "phones",
                "type": "array",
                "label": "Phones",
                "of": { "id": "t1", "key": "phone", "type": "text", "label": "Phone" }
            }]
        });
        let field: Field = serde_json::from_value(raw).unwrap();
        let children = field.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].template().unwrap().key, "phone");
        assert_eq!(field.subtree_ids(), vec!["s1", "a1", "t1"]);
    }

    #[test]
    fn null_default_survives_round_trip() {
        let mut field = Field::new("f", "k", "K", FieldKind::Text);
        field.default_value = Some(Value::Null);
        let text = serde_json::to_string(&field).unwrap();
        assert!(text.contains(r#""defaultValue":null"#));
        let back: Field = serde_json::from_str(&text).unwrap();
        assert_eq!(back, field);

        let absent: Field =
            serde_json::from_value(json!({"id": "f", "key": "k", "type": "text", "label": "K"})).unwrap();
        assert_eq!(absent.default_value, None);
    }

    #[test]
    fn blank_expressions_are_absent() {
        let mut field = Field::new("f", "k", "K", FieldKind::Text);
        field.computed = Some("   ".into());
        field.visible_when = Some(" age > 3 ".into());
        assert!(!field.is_computed());
        assert_eq!(field.visibility_expr(), Some("age > 3"));
    }
}
