use anyhow::Result;
use clap::Args;
use form_schema::{FieldType, create_field};

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// text, number, date, checkbox, select, multiselect, radio, section or array
    #[arg(value_name = "TYPE")]
    pub field_type: FieldType,
    /// Label of the field; defaults to the palette name of the type
    #[arg(long)]
    pub label: Option<String>,
}

pub fn run(args: NewArgs) -> Result<()> {
    let label = args
        .label
        .unwrap_or_else(|| args.field_type.palette_label().to_string());
    let field = create_field(args.field_type, label);
    print!("{}", super::to_pretty(&field)?);
    Ok(())
}
