use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use form_schema::Schema;

#[derive(Args, Debug, Clone)]
pub struct JsonSchemaArgs {
    /// Write to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

pub fn run(args: JsonSchemaArgs) -> Result<()> {
    let document = schemars::schema_for!(Schema);
    let text = super::to_pretty(&document)?;
    match args.out {
        Some(path) => super::write_text(&path, &text),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}
