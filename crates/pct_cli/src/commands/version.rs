//! Version command - Show build information.

use anyhow::Result;
use clap::Args;

use super::build_metadata;

#[derive(Args)]
pub struct VersionArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

/// `<version> <commit> <build date>`, as shown by `--version`.
pub fn long_version() -> String {
    let build = build_metadata();
    format!("{} {} {}", build.version, build.commit_hash, build.build_date)
}

pub fn execute(args: VersionArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&build_metadata())?);
    } else {
        println!("pct {}", long_version());
    }
    Ok(())
}
