use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use form_schema::{Expression, Values, evaluate_computed, evaluate_visibility};
use serde_json::Value;

#[derive(Args, Debug, Clone)]
pub struct ExprArgs {
    /// Expression source, e.g. `age >= 18 && plan == 'pro'`
    #[arg(value_name = "EXPRESSION", allow_hyphen_values = true)]
    pub source: String,
    /// JSON object the expression reads field values from
    #[arg(long, value_name = "values.json")]
    pub values: Option<PathBuf>,
    /// Evaluate as a computed value instead of a visibility condition
    #[arg(long)]
    pub computed: bool,
}

/// Parse failures are reported as errors here even though forms ignore
/// them, so authors see them before a form silently shows every field.
pub fn run(args: ExprArgs) -> Result<()> {
    let expression =
        Expression::parse(&args.source).map_err(|err| anyhow!("invalid expression: {err}"))?;
    let refs: Vec<_> = expression.field_refs().into_iter().collect();
    tracing::debug!(refs = ?refs, "expression parsed");

    let values = match &args.values {
        Some(path) => super::read_values(path)?,
        None => Values::new(),
    };
    let source = Some(args.source.as_str());
    if args.computed {
        let value = evaluate_computed(source, &values).unwrap_or(Value::Null);
        println!("{value}");
    } else {
        println!("{}", evaluate_visibility(source, &values));
    }
    Ok(())
}
