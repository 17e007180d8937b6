//! CLI command definitions and argument parsing.

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reclaim - inspect and manage the resource candidate cache.
#[derive(Debug, Parser)]
#[command(name = "reclaim")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and validate a configuration file
    Check(CheckArgs),

    /// List owners with recorded candidates
    Owners(DbArgs),

    /// List candidate records with their lease status
    Candidates(CandidatesArgs),

    /// Retract candidate records by id, leaving leases alone
    Release(ReleaseArgs),

    /// Summarize candidates per owner to the log
    Notify(CheckArgs),
}

/// Arguments naming a configuration file.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Configuration file
    #[arg(short, long, env = "RECLAIM_CONFIG", default_value = "reclaim.toml")]
    pub config: PathBuf,
}

/// Arguments naming the candidate database.
#[derive(Debug, Parser)]
pub struct DbArgs {
    /// SQLite candidate database
    #[arg(short, long, env = "RECLAIM_DB", default_value = "reclaim.db")]
    pub db: PathBuf,
}

/// Arguments for the candidates command.
#[derive(Debug, Parser)]
pub struct CandidatesArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Only this owner's records ("" selects unowned resources)
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Only records from this account
    #[arg(short, long)]
    pub account: Option<String>,

    /// Only records of this kind
    #[arg(short, long)]
    pub kind: Option<String>,
}

/// Arguments for the release command.
#[derive(Debug, Parser)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Owner the records are filed under
    #[arg(short, long)]
    pub owner: String,

    /// Resource ids to release
    pub ids: Vec<String>,

    /// Read ids from file (one per line)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_command() {
        let cli = Cli::parse_from([
            "reclaim",
            "candidates",
            "--db",
            "/tmp/r.db",
            "--owner",
            "alice",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, CliFormat::Json);
        match cli.command {
            Command::Candidates(args) => {
                assert_eq!(args.db.db, PathBuf::from("/tmp/r.db"));
                assert_eq!(args.owner.as_deref(), Some("alice"));
                assert!(args.kind.is_none());
            }
            _ => panic!("Expected Candidates command"),
        }
    }

    #[test]
    fn test_release_command() {
        let cli = Cli::parse_from(["reclaim", "release", "--owner", "", "vol-1", "vol-2"]);
        match cli.command {
            Command::Release(args) => {
                assert_eq!(args.owner, "");
                assert_eq!(args.ids, vec!["vol-1", "vol-2"]);
            }
            _ => panic!("Expected Release command"),
        }
    }

    #[test]
    fn test_release_requires_owner() {
        assert!(Cli::try_parse_from(["reclaim", "release", "vol-1"]).is_err());
    }

    #[test]
    fn test_format_conversion() {
        let format: OutputFormat = CliFormat::Quiet.into();
        assert_eq!(format, OutputFormat::Quiet);
    }
}
