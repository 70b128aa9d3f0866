use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use form_schema::Schema;

#[derive(Args, Debug, Clone)]
pub struct FmtArgs {
    #[arg(value_name = "schema.json")]
    pub schema: PathBuf,
    /// Rewrite the file in place instead of printing
    #[arg(long, conflicts_with = "check")]
    pub write: bool,
    /// Fail when the file is not already canonical
    #[arg(long)]
    pub check: bool,
}

pub fn run(args: FmtArgs) -> Result<()> {
    let original = super::read_text(&args.schema)?;
    let schema = Schema::from_json(&original)
        .with_context(|| format!("{} is not a valid schema", args.schema.display()))?;
    let mut canonical = schema.to_json().context("failed to encode schema")?;
    canonical.push('\n');

    if args.check {
        if original != canonical {
            bail!("{} is not in canonical form", args.schema.display());
        }
        return Ok(());
    }
    if args.write {
        if original != canonical {
            super::write_text(&args.schema, &canonical)?;
            eprintln!("formatted {}", args.schema.display());
        }
        return Ok(());
    }
    print!("{canonical}");
    Ok(())
}
