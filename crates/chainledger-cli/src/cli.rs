//! CLI argument definitions for chainledger.
//!
//! # Commands
//!
//! | Command  | Description |
//! |----------|-------------|
//! | `events` | Fetch and validate one source's events for an account |
//! | `batch`  | Fetch several sources concurrently and merge the results |
//! | `export` | Export a validated collection as CSV or JSON |
//! | `sources`| List registered sources, their modes and capabilities |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Envelope output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Blockchain accounting-event normalizer.
///
/// Pulls raw platform events from per-chain sources, normalizes them into one
/// canonical schema, validates the collection, and exports it once clean.
#[derive(Debug, Parser)]
#[command(
    name = "chainledger",
    author,
    version,
    about = "Normalize, validate, and export blockchain accounting events"
)]
pub struct Cli {
    /// Envelope output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and validate one source's events for an account.
    Events(EventsArgs),
    /// Fetch several sources concurrently and merge the results.
    Batch(BatchArgs),
    /// Export a validated collection as CSV or JSON.
    Export(ExportArgs),
    /// List registered sources, their modes and capabilities.
    Sources(SourcesArgs),
}

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Registered source id (see `chainledger sources`).
    pub source: String,

    /// Account address in the source chain's native format.
    pub account: String,

    /// API key for sources that require credentials.
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Account address; each source applies its own format predicate.
    pub account: String,

    /// Source id to include; repeat the flag for each source.
    #[arg(long = "source", required = true)]
    pub sources: Vec<String>,

    /// API key shared with every selected source that wants one.
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Account address; each source applies its own format predicate.
    pub account: String,

    /// Source id to include; repeat the flag for each source.
    #[arg(long = "source", required = true)]
    pub sources: Vec<String>,

    /// API key shared with every selected source that wants one.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Export document format.
    #[arg(long = "as", value_enum, default_value_t = ExportFormat::Csv)]
    pub export_format: ExportFormat,

    /// Write the document to this path instead of the envelope.
    #[arg(long)]
    pub out: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// Include the full capability matrix per source.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn batch_requires_at_least_one_source() {
        let result = Cli::try_parse_from(["chainledger", "batch", "cosmos1abc"]);
        assert!(result.is_err());
    }

    #[test]
    fn export_defaults_to_csv() {
        let cli = Cli::try_parse_from([
            "chainledger",
            "export",
            "cosmos1abc",
            "--source",
            "cosmoshub",
        ])
        .expect("must parse");
        let Command::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.export_format, ExportFormat::Csv);
        assert!(args.out.is_none());
    }
}
