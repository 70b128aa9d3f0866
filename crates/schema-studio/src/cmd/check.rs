use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use form_schema::validate::compile_pattern;
use form_schema::{Field, Schema, expr};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(value_name = "schema.json")]
    pub schema: PathBuf,
    /// Treat expression and pattern warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Something the engine will tolerate at runtime but that is almost
/// certainly a mistake in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub field_key: String,
    pub message: String,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let schema = super::read_schema(&args.schema)?;
    let warnings = lint(&schema);
    for warning in &warnings {
        eprintln!("warning: {}: {}", warning.field_key, warning.message);
    }
    if args.strict && !warnings.is_empty() {
        bail!(
            "schema-check: {} warning(s) treated as errors (--strict)",
            warnings.len()
        );
    }
    let mut total = 0usize;
    for field in &schema.fields {
        field.visit(&mut |_| total += 1);
    }
    println!(
        "{}: ok ({} top-level field(s), {} in total)",
        args.schema.display(),
        schema.fields.len(),
        total
    );
    Ok(())
}

/// Expressions that do not parse and patterns that do not compile. Both
/// are silently ignored when a form is rendered.
pub fn lint(schema: &Schema) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for root in &schema.fields {
        root.visit(&mut |field: &Field| {
            let mut warn = |message: String| {
                warnings.push(Warning {
                    field_key: field.key.clone(),
                    message,
                })
            };
            if let Some(source) = field.visibility_expr()
                && let Err(err) = expr::check(source)
            {
                warn(format!("visibleWhen does not parse: {err}"));
            }
            if let Some(source) = field.computed_expr()
                && let Err(err) = expr::check(source)
            {
                warn(format!("computed does not parse: {err}"));
            }
            if let Some(pattern) = field.rules().and_then(|rules| rules.regex.as_deref())
                && !pattern.is_empty()
                && compile_pattern(pattern).is_none()
            {
                warn(format!("pattern '{pattern}' does not compile"));
            }
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_schema::{FieldKind, ValidationRules};

    #[test]
    fn lint_reports_broken_expressions_and_patterns() {
        let mut gated = Field::new("a", "gated", "Gated", FieldKind::Text);
        gated.visible_when = Some("alert(1)".into());
        let mut total = Field::new("b", "total", "Total", FieldKind::Number);
        total.computed = Some("price * qty".into());
        let mut code = Field::new("c", "code", "Code", FieldKind::Text);
        code.validation = Some(ValidationRules {
            regex: Some("([a-z".into()),
            ..ValidationRules::default()
        });
        let section = Field::new(
            "s",
            "group",
            "Group",
            FieldKind::Section {
                children: vec![code],
            },
        );
        let schema = Schema::with_fields(vec![gated, total, section]);

        let warnings = lint(&schema);
        let keys: Vec<_> = warnings.iter().map(|w| w.field_key.as_str()).collect();
        assert_eq!(keys, vec!["gated", "code"]);
        assert!(warnings[0].message.starts_with("visibleWhen"));
    }
}
