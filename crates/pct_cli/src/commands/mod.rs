//! CLI command definitions.

use clap::{Parser, Subcommand};
use pct_templates::BuildMetadata;

pub mod new;
pub mod version;

/// pct - create projects and items from templates
#[derive(Parser)]
#[command(name = "pct")]
#[command(version, about = "Create projects and items from templates")]
#[command(long_about = r#"
pct scaffolds new projects, or new items inside existing projects, from
installed templates.

COMMANDS:
  new       → List installed templates or deploy one
  version   → Show version, commit and build date

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a project or other artifact from a template
    New(new::NewArgs),

    /// Show version information
    Version(version::VersionArgs),
}

/// Metadata of this build, handed to templates as `pdk.*`.
pub fn build_metadata() -> BuildMetadata {
    BuildMetadata::new(
        env!("CARGO_PKG_VERSION"),
        option_env!("PCT_COMMIT_HASH").unwrap_or("unknown"),
        option_env!("PCT_BUILD_DATE").unwrap_or("unknown"),
    )
}
