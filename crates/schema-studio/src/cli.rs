use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use crate::cmd::{
    self, apply::ApplyArgs, check::CheckArgs, expr::ExprArgs, fmt::FmtArgs,
    json_schema::JsonSchemaArgs, new::NewArgs, preview::PreviewArgs,
};
use crate::config;

#[derive(Parser, Debug)]
#[command(
    name = "schema-studio",
    about = "Toolkit for form-schema documents",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log engine decisions (fail-open expressions, store commits) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with a [store] table
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a schema document and the expressions inside it
    Check(CheckArgs),
    /// Rewrite a schema document in canonical form
    Fmt(FmtArgs),
    /// Print a freshly created field of the given type
    New(NewArgs),
    /// Run store operations against a schema or a saved session
    Apply(ApplyArgs),
    /// Render values against a schema: computed fields, visibility, validation
    Preview(PreviewArgs),
    /// Check and evaluate a single expression
    Expr(ExprArgs),
    /// Print the JSON Schema of the document format
    JsonSchema(JsonSchemaArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Check(args) => cmd::check::run(args),
        Commands::Fmt(args) => cmd::fmt::run(args),
        Commands::New(args) => cmd::new::run(args),
        Commands::Apply(args) => cmd::apply::run(args, &config),
        Commands::Preview(args) => cmd::preview::run(args),
        Commands::Expr(args) => cmd::expr::run(args),
        Commands::JsonSchema(args) => cmd::json_schema::run(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_schema::FieldType;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "schema-studio",
            "apply",
            "--ops",
            "ops.json",
            "--session",
            "state",
            "-v",
            "--config",
            "studio.toml",
        ])
        .expect("expected CLI to parse");
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("studio.toml")));
        match cli.command {
            Commands::Apply(args) => {
                assert_eq!(args.ops, Some(PathBuf::from("ops.json")));
                assert_eq!(args.session, Some(PathBuf::from("state")));
                assert!(args.schema.is_none());
                assert!(args.out.is_none());
            }
            _ => panic!("expected apply args"),
        }
    }

    #[test]
    fn parses_field_type_argument() {
        let cli = Cli::try_parse_from(["schema-studio", "new", "Multiselect", "--label", "Tags"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::New(args) => {
                assert_eq!(args.field_type, FieldType::Multiselect);
                assert_eq!(args.label.as_deref(), Some("Tags"));
            }
            _ => panic!("expected new args"),
        }
        assert!(Cli::try_parse_from(["schema-studio", "new", "textarea"]).is_err());
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["schema-studio"]).is_err());
    }
}
