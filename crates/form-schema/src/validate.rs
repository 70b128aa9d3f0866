//! Per-field rule checks over a value context.
//!
//! Fields are walked in tree order. Hidden fields and computed fields are
//! never reported. Array values are checked element by element against the
//! array's template, each element in its own scope.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use time::Date;
use time::macros::format_description;
use tracing::debug;

use crate::Values;
use crate::computed;
use crate::expr::{self, evaluate_visibility};
use crate::spec::{Field, FieldKind, FieldType, Schema, SelectOption, ValidationRules};

/// Stable machine-readable reason next to the human message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    InvalidNumber,
    BelowMinimum,
    AboveMaximum,
    TooShort,
    TooLong,
    TooFewSelected,
    TooManySelected,
    TooFewItems,
    TooManyItems,
    PatternMismatch,
    UnknownOption,
    InvalidDate,
    TypeMismatch,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::InvalidNumber => "invalid_number",
            ErrorCode::BelowMinimum => "below_minimum",
            ErrorCode::AboveMaximum => "above_maximum",
            ErrorCode::TooShort => "too_short",
            ErrorCode::TooLong => "too_long",
            ErrorCode::TooFewSelected => "too_few_selected",
            ErrorCode::TooManySelected => "too_many_selected",
            ErrorCode::TooFewItems => "too_few_items",
            ErrorCode::TooManyItems => "too_many_items",
            ErrorCode::PatternMismatch => "pattern_mismatch",
            ErrorCode::UnknownOption => "unknown_option",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::TypeMismatch => "type_mismatch",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_id: String,
    /// Location in the value context, e.g. `/contacts/0/email`.
    pub path: String,
    pub message: String,
    pub code: ErrorCode,
}

/// Outcome of one validation pass: an entry per checked value slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    entries: BTreeMap<String, Option<FieldError>>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.entries.values().any(Option::is_some)
    }

    /// Error for `key` (`name`, `tags[2]`, `contacts[0].email`).
    pub fn error(&self, key: &str) -> Option<&FieldError> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    pub fn message(&self, key: &str) -> Option<&str> {
        self.error(key).map(|err| err.message.as_str())
    }

    /// Whether `key` was looked at, with or without an error.
    pub fn checked(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.entries
            .iter()
            .filter_map(|(key, err)| err.as_ref().map(|err| (key.as_str(), err)))
    }

    pub fn entries(&self) -> &BTreeMap<String, Option<FieldError>> {
        &self.entries
    }
}

/// Validates `values` against `schema`.
///
/// `values` should already carry computed results (see
/// [`crate::apply_computed`]); visibility is evaluated against it as given.
pub fn validate(schema: &Schema, values: &Values) -> ValidationReport {
    let mut report = ValidationReport::default();
    let scope = Scope {
        values,
        key_prefix: String::new(),
        path_prefix: String::new(),
    };
    validate_fields(&schema.fields, &scope, true, &mut report);
    report
}

struct Scope<'a> {
    values: &'a Values,
    key_prefix: String,
    path_prefix: String,
}

impl Scope<'_> {
    fn slot(&self, key: &str) -> (String, String) {
        (
            format!("{}{key}", self.key_prefix),
            format!("{}/{key}", self.path_prefix),
        )
    }
}

fn validate_fields(fields: &[Field], scope: &Scope<'_>, parent_visible: bool, report: &mut ValidationReport) {
    for field in fields {
        let visible = parent_visible && evaluate_visibility(field.visibility_expr(), scope.values);
        if let FieldKind::Section { children } = &field.kind {
            validate_fields(children, scope, visible, report);
            continue;
        }
        let (key, path) = scope.slot(&field.key);
        let value = scope.values.get(&field.key).unwrap_or(&Value::Null);
        let error = if visible && !field.is_computed() {
            check_field(field, value, &key, &path, scope.values, report)
        } else {
            None
        };
        report.entries.insert(
            key,
            error.map(|(code, message)| FieldError {
                field_id: field.id.clone(),
                path,
                message,
                code,
            }),
        );
    }
}

type Failure = (ErrorCode, String);

fn check_field(
    field: &Field,
    value: &Value,
    key: &str,
    path: &str,
    enclosing: &Values,
    report: &mut ValidationReport,
) -> Option<Failure> {
    if is_missing(value) {
        if field.required {
            return Some((ErrorCode::Required, "This field is required.".to_string()));
        }
        // An untouched slot has nothing to check. A cleared text input or
        // list is still held to its length, count and pattern rules.
        let cleared = matches!(value, Value::String(_) | Value::Array(_));
        if !cleared || field.field_type() == FieldType::Number {
            return None;
        }
    }
    let rules = field.rules();
    match &field.kind {
        FieldKind::Number => check_number(value, rules),
        FieldKind::Checkbox => None,
        FieldKind::Multiselect { .. } => check_count(
            value,
            rules,
            (ErrorCode::TooFewSelected, "Select at least"),
            (ErrorCode::TooManySelected, "Select at most"),
            "",
        ),
        FieldKind::Array { of } => {
            let failure = check_count(
                value,
                rules,
                (ErrorCode::TooFewItems, "Add at least"),
                (ErrorCode::TooManyItems, "Add at most"),
                " items",
            );
            if let Some(items) = value.as_array() {
                validate_items(of, items, key, path, enclosing, report);
            }
            failure
        }
        FieldKind::Select { options } | FieldKind::Radio { options } => {
            check_text(value, rules, field.field_type(), Some(options))
        }
        FieldKind::Text | FieldKind::Date => check_text(value, rules, field.field_type(), None),
        FieldKind::Section { .. } => None,
    }
}

/// Absent, null, blank text and empty lists count as not filled in.
fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_number(value: &Value, rules: Option<&ValidationRules>) -> Option<Failure> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        return Some((ErrorCode::InvalidNumber, "Enter a valid number.".to_string()));
    };
    let rules = rules?;
    if let Some(min) = rules.min
        && number < min
    {
        return Some((ErrorCode::BelowMinimum, format!("Must be ≥ {min}.")));
    }
    if let Some(max) = rules.max
        && number > max
    {
        return Some((ErrorCode::AboveMaximum, format!("Must be ≤ {max}.")));
    }
    None
}

fn check_count(
    value: &Value,
    rules: Option<&ValidationRules>,
    too_few: (ErrorCode, &str),
    too_many: (ErrorCode, &str),
    unit: &str,
) -> Option<Failure> {
    let Some(items) = value.as_array() else {
        return Some((ErrorCode::TypeMismatch, "Expected a list of values.".to_string()));
    };
    let rules = rules?;
    let len = items.len() as f64;
    if let Some(min) = rules.min
        && len < min
    {
        return Some((too_few.0, format!("{} {min}{unit}.", too_few.1)));
    }
    if let Some(max) = rules.max
        && len > max
    {
        return Some((too_many.0, format!("{} {max}{unit}.", too_many.1)));
    }
    None
}

fn check_text(
    value: &Value,
    rules: Option<&ValidationRules>,
    field_type: FieldType,
    options: Option<&[SelectOption]>,
) -> Option<Failure> {
    let text = match value {
        Value::Array(_) | Value::Object(_) => {
            return Some((ErrorCode::TypeMismatch, "Expected a single value.".to_string()));
        }
        other => expr::display(other),
    };
    let blank = text.trim().is_empty();
    if !blank
        && let Some(options) = options
        && !options.iter().any(|option| option.value == text)
    {
        return Some((ErrorCode::UnknownOption, "Choose one of the listed options.".to_string()));
    }
    if !blank && field_type == FieldType::Date && !is_iso_date(&text) {
        return Some((ErrorCode::InvalidDate, "Enter a valid date (YYYY-MM-DD).".to_string()));
    }
    let rules = rules?;
    if let Some(pattern) = rules.regex.as_deref().and_then(compile_pattern)
        && !pattern.is_match(&text)
    {
        return Some((ErrorCode::PatternMismatch, "Value does not match pattern.".to_string()));
    }
    let len = text.chars().count() as f64;
    if let Some(min) = rules.min
        && len < min
    {
        return Some((ErrorCode::TooShort, format!("Must be at least {min} characters.")));
    }
    if let Some(max) = rules.max
        && len > max
    {
        return Some((ErrorCode::TooLong, format!("Must be at most {max} characters.")));
    }
    None
}

fn is_iso_date(text: &str) -> bool {
    Date::parse(text, format_description!("[year]-[month]-[day]")).is_ok()
}

/// Compiles a configured pattern. `/body/flags` honours the `i`, `m` and
/// `s` flags; `g`, `u` and `y` are accepted and have no effect. Anything
/// else, `/usr/bin` included, is taken as a plain pattern. A pattern that
/// does not compile is no constraint at all.
pub fn compile_pattern(raw: &str) -> Option<Regex> {
    if raw.trim().is_empty() {
        return None;
    }
    let (body, flags) = split_flags(raw);
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            _ => {}
        }
    }
    match builder.build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            debug!(pattern = raw, error = %err, "ignoring malformed pattern");
            None
        }
    }
}

const JS_FLAGS: &str = "gimsuy";

fn split_flags(raw: &str) -> (&str, &str) {
    if let Some(rest) = raw.strip_prefix('/')
        && let Some(end) = rest.rfind('/')
        && rest[end + 1..].chars().all(|c| JS_FLAGS.contains(c))
    {
        return (&rest[..end], &rest[end + 1..]);
    }
    (raw, "")
}

/// Checks each element of an array value against the template.
///
/// The template's own `visibleWhen` reads the scope that holds the array,
/// as it does for the visibility map. A section template expects objects;
/// each one is the whole context of its element and errors are keyed
/// `key[i].child`. Any other template reports as `key[i]`.
fn validate_items(
    template: &Field,
    items: &[Value],
    key: &str,
    path: &str,
    enclosing: &Values,
    report: &mut ValidationReport,
) {
    let visible = evaluate_visibility(template.visibility_expr(), enclosing);
    for (index, item) in items.iter().enumerate() {
        let element_key = format!("{key}[{index}]");
        let element_path = format!("{path}/{index}");
        if let FieldKind::Section { children } = &template.kind {
            let Some(entries) = item.as_object() else {
                report.entries.insert(
                    element_key,
                    Some(FieldError {
                        field_id: template.id.clone(),
                        path: element_path,
                        message: "Expected a group of values.".to_string(),
                        code: ErrorCode::TypeMismatch,
                    }),
                );
                continue;
            };
            let mut values = entries.clone();
            computed::apply_in(children, &mut values);
            let scope = Scope {
                values: &values,
                key_prefix: format!("{element_key}."),
                path_prefix: element_path,
            };
            validate_fields(children, &scope, visible, report);
        } else {
            let error = if visible && !template.is_computed() {
                check_field(template, item, &element_key, &element_path, enclosing, report)
            } else {
                None
            };
            report.entries.insert(
                element_key,
                error.map(|(code, message)| FieldError {
                    field_id: template.id.clone(),
                    path: element_path,
                    message,
                    code,
                }),
            );
        }
    }
}
