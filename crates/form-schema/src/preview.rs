use serde::Serialize;

use crate::Values;
use crate::computed::apply_computed;
use crate::spec::Schema;
use crate::validate::{ValidationReport, validate};
use crate::visibility::{VisibilityMap, resolve_visibility};

/// Everything a renderer needs for one frame of a live form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPreview {
    /// Context after computed fields were applied.
    pub values: Values,
    pub visibility: VisibilityMap,
    pub report: ValidationReport,
}

impl FormPreview {
    /// Applies computed fields to `values`, then resolves visibility and
    /// validates against the result.
    pub fn build(schema: &Schema, values: &Values) -> Self {
        let values = apply_computed(schema, values);
        let visibility = resolve_visibility(schema, &values);
        let report = validate(schema, &values);
        Self {
            values,
            visibility,
            report,
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.report.has_errors()
    }
}
