use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StoreError;
use crate::spec::{Field, FieldKind, SelectOption, ValidationRules};

/// Partial update of a field's own attributes.
///
/// `None` leaves an attribute alone. For optional attributes `Some(None)`
/// (a JSON `null`) clears the value. Identity and type cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub placeholder: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub help_text: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub default_value: Option<Option<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationPatch>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub visible_when: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub computed: Option<Option<String>>,
    /// Replaces the option list of a select, multiselect or radio field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    /// Replaces the template of an array field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of: Option<Box<Field>>,
}

/// Merged into the existing constraint block one key at a time, so setting
/// `max` keeps a configured `min`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationPatch {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub min: Option<Option<f64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub max: Option<Option<f64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub regex: Option<Option<String>>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self == &FieldPatch::default()
    }

    /// Returns `field` with the patch merged in. The input is not touched.
    pub fn apply(&self, field: &Field) -> Result<Field, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidPatch {
            id: field.id.clone(),
            reason: reason.to_string(),
        };
        let mut next = field.clone();
        if let Some(key) = &self.key {
            if key.trim().is_empty() {
                return Err(invalid("key must not be empty"));
            }
            next.key = key.clone();
        }
        if let Some(label) = &self.label {
            next.label = label.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            next.placeholder = placeholder.clone();
        }
        if let Some(help_text) = &self.help_text {
            next.help_text = help_text.clone();
        }
        if let Some(required) = self.required {
            next.required = required;
        }
        if let Some(default_value) = &self.default_value {
            next.default_value = default_value.clone();
        }
        if let Some(visible_when) = &self.visible_when {
            next.visible_when = visible_when.clone();
        }
        if let Some(computed) = &self.computed {
            next.computed = computed.clone();
        }
        if let Some(validation) = &self.validation {
            next.validation = validation.merge(field.validation.as_ref()).map_err(invalid)?;
        }
        if let Some(options) = &self.options {
            let slot = next
                .options_mut()
                .ok_or_else(|| invalid("only select, multiselect and radio fields have options"))?;
            *slot = options.clone();
        }
        if let Some(template) = &self.of {
            let FieldKind::Array { of } = &mut next.kind else {
                return Err(invalid("only array fields have a template"));
            };
            *of = template.clone();
        }
        Ok(next)
    }
}

impl ValidationPatch {
    fn merge(&self, current: Option<&ValidationRules>) -> Result<Option<ValidationRules>, &'static str> {
        let mut rules = current.cloned().unwrap_or_default();
        if let Some(min) = self.min {
            rules.min = min;
        }
        if let Some(max) = self.max {
            rules.max = max;
        }
        if let Some(regex) = &self.regex {
            rules.regex = regex.clone();
        }
        if rules.min.is_some_and(|n| !n.is_finite()) || rules.max.is_some_and(|n| !n.is_finite()) {
            return Err("min and max must be finite numbers");
        }
        if current.is_none() && rules.is_empty() {
            return Ok(None);
        }
        Ok(Some(rules))
    }
}
