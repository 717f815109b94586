use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use templating::Alignment;

#[derive(Parser)]
#[command(name = "conform")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep dbt packages conformant with the organization template", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ./conform.toml, then the user config dir)
    #[arg(long, global = true, env = "CONFORM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring existing packages up to the current template
    #[command(subcommand)]
    Migrate(MigrateCommand),

    /// Create a new package that already conforms
    Scaffold(ScaffoldArgs),

    /// Inspect template catalogs
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Migrate Commands
// ============================================================================

#[derive(Subcommand)]
pub enum MigrateCommand {
    /// Migrate one package directory
    Package(PackageArgs),

    /// Migrate every package under the repository root
    All(AllArgs),

    /// List template versions and what each changed
    List,
}

/// How detected changes are handled
#[derive(Args, Clone, Copy)]
pub struct ModeArgs {
    /// Show what would change without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply without asking
    #[arg(short, long, conflicts_with = "dry_run")]
    pub force: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Package directory (contains dbt_project.yml)
    pub path: PathBuf,

    #[command(flatten)]
    pub mode: ModeArgs,
}

#[derive(Args)]
pub struct AllArgs {
    /// Only packages of this alignment
    #[arg(short, long, value_enum)]
    pub alignment: Option<AlignmentArg>,

    /// Repository root containing packages/ (overrides config)
    #[arg(long)]
    pub root: Option<PathBuf>,

    #[command(flatten)]
    pub mode: ModeArgs,

    /// Number of packages migrated in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Scaffold
// ============================================================================

#[derive(Args)]
pub struct ScaffoldArgs {
    /// Directory of the new package
    pub path: PathBuf,

    /// Package name (dbt project name)
    #[arg(long)]
    pub name: String,

    /// Show what would be created without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

// ============================================================================
// Catalog Commands
// ============================================================================

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Show the active catalog
    Show,

    /// Check a catalog file for problems
    Validate {
        /// Catalog YAML file
        path: PathBuf,
    },
}

/// Package alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlignmentArg {
    SourceAligned,
    ConsumerAligned,
    Utils,
}

impl From<AlignmentArg> for Alignment {
    fn from(arg: AlignmentArg) -> Self {
        match arg {
            AlignmentArg::SourceAligned => Self::SourceAligned,
            AlignmentArg::ConsumerAligned => Self::ConsumerAligned,
            AlignmentArg::Utils => Self::Utility,
        }
    }
}
