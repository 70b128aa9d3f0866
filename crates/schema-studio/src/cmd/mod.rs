pub mod apply;
pub mod check;
pub mod expr;
pub mod fmt;
pub mod json_schema;
pub mod new;
pub mod preview;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use form_schema::values::values_from_json;
use form_schema::{Schema, Values};

pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub(crate) fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Reads and checks a schema document.
pub(crate) fn read_schema(path: &Path) -> Result<Schema> {
    let text = read_text(path)?;
    Schema::from_json(&text).with_context(|| format!("{} is not a valid schema", path.display()))
}

/// Reads a JSON object of field values.
pub(crate) fn read_values(path: &Path) -> Result<Values> {
    let text = read_text(path)?;
    let raw: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    values_from_json(raw).ok_or_else(|| anyhow!("{} must hold a JSON object", path.display()))
}

/// Pretty JSON with a trailing newline.
pub(crate) fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
    text.push('\n');
    Ok(text)
}
