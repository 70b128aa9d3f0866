use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use form_schema::visibility::is_visible;
use form_schema::{FormPreview, Schema, seed_defaults};

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[arg(value_name = "schema.json")]
    pub schema: PathBuf,
    /// JSON object of entered values, laid over the defaults
    #[arg(long, value_name = "values.json")]
    pub values: Option<PathBuf>,
    /// Print the full preview (values, visibility, report) as JSON
    #[arg(long)]
    pub json: bool,
    /// Exit with an error when any field fails validation
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: PreviewArgs) -> Result<()> {
    let schema = super::read_schema(&args.schema)?;
    let mut values = seed_defaults(&schema);
    if let Some(path) = &args.values {
        values.extend(super::read_values(path)?);
    }
    let preview = FormPreview::build(&schema, &values);

    if args.json {
        print!("{}", super::to_pretty(&preview)?);
    } else {
        print!("{}", render(&schema, &preview));
    }

    let errors = preview.report.errors().count();
    if args.strict && errors > 0 {
        bail!("preview: {errors} field(s) failed validation (--strict)");
    }
    Ok(())
}

/// Plain-text summary: values, hidden fields, then errors.
pub fn render(schema: &Schema, preview: &FormPreview) -> String {
    let mut out = String::new();
    out.push_str("values:\n");
    for (key, value) in &preview.values {
        out.push_str(&format!("  {key} = {value}\n"));
    }

    let mut hidden = Vec::new();
    for root in &schema.fields {
        root.visit(&mut |field| {
            if !is_visible(&preview.visibility, &field.id) {
                hidden.push(field.key.as_str());
            }
        });
    }
    if !hidden.is_empty() {
        out.push_str(&format!("hidden: {}\n", hidden.join(", ")));
    }

    let errors: Vec<_> = preview.report.errors().collect();
    if errors.is_empty() {
        out.push_str("ok: form can be submitted\n");
    } else {
        out.push_str("errors:\n");
        for (key, error) in &errors {
            out.push_str(&format!("  {key}: {} ({})\n", error.message, error.code));
        }
    }
    out
}
