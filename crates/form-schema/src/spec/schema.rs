use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::{Field, FieldKind};

/// Document format version understood by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Root of a form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub version: u32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

/// Reasons an external document is rejected before it reaches the store.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed schema document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("field with key '{key}' has an empty id")]
    EmptyId { key: String },
    #[error("duplicate field id '{0}'")]
    DuplicateId(String),
    #[error("field '{id}' has an empty key")]
    EmptyKey { id: String },
    #[error("duplicate field key '{key}' in scope '{scope}'")]
    DuplicateKey { key: String, scope: String },
}

impl Schema {
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(fields: Vec<Field>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            fields,
        }
    }

    /// Parses and shape-checks a document. Nothing is returned unless the
    /// whole document is acceptable.
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let schema: Schema = serde_json::from_str(text)?;
        schema.check()?;
        Ok(schema)
    }

    /// Canonical text form: pretty JSON with the field order of the types.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Verifies the invariants every stored schema upholds: supported
    /// version, non-empty globally unique ids, non-empty keys unique within
    /// their value namespace.
    pub fn check(&self) -> Result<(), ImportError> {
        if self.version != SCHEMA_VERSION {
            return Err(ImportError::UnsupportedVersion {
                found: self.version,
                expected: SCHEMA_VERSION,
            });
        }
        let mut ids = BTreeSet::new();
        for field in &self.fields {
            let mut outcome = Ok(());
            field.visit(&mut |node| {
                if outcome.is_err() {
                    return;
                }
                if node.id.trim().is_empty() {
                    outcome = Err(ImportError::EmptyId {
                        key: node.key.clone(),
                    });
                } else if !ids.insert(node.id.as_str()) {
                    outcome = Err(ImportError::DuplicateId(node.id.clone()));
                } else if node.key.trim().is_empty() {
                    outcome = Err(ImportError::EmptyKey {
                        id: node.id.clone(),
                    });
                }
            });
            outcome?;
        }
        for (scope, keys) in key_scopes(&self.fields) {
            let mut seen = BTreeSet::new();
            for key in keys {
                if !seen.insert(key) {
                    return Err(ImportError::DuplicateKey {
                        key: key.to_string(),
                        scope,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Name of the value namespace at the document root.
pub const ROOT_SCOPE: &str = "$";

/// Groups field keys by the value namespace they bind into.
///
/// Root fields and everything nested in sections share the root namespace.
/// An array template opens a namespace of its own, named after the array's
/// scope path (`$.items[]`), because each array element is validated with
/// its own values.
pub fn key_scopes(fields: &[Field]) -> BTreeMap<String, Vec<&str>> {
    let mut scopes = BTreeMap::new();
    collect_scope(fields, ROOT_SCOPE.to_string(), &mut scopes);
    scopes
}

fn collect_scope<'a>(
    fields: &'a [Field],
    scope: String,
    scopes: &mut BTreeMap<String, Vec<&'a str>>,
) {
    for field in fields {
        scopes
            .entry(scope.clone())
            .or_default()
            .push(field.key.as_str());
        match &field.kind {
            FieldKind::Section { children } => collect_scope(children, scope.clone(), scopes),
            FieldKind::Array { of } => {
                let inner = format!("{scope}.{}[]", field.key);
                collect_scope(std::slice::from_ref(of.as_ref()), inner, scopes);
            }
            _ => {}
        }
    }
}
