//! Argument parsing: the recognized subcommands and the flags common to
//! both of them.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gitsu", version, about = "Resolve and install components")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Skip `devDependencies`.
    #[arg(long, global = true)]
    pub production: bool,

    /// Redeploy even when the installed metadata already matches.
    #[arg(long, global = true)]
    pub force: bool,

    /// On conflict, elect the highest candidate without prompting.
    #[arg(long = "force-latest", global = true)]
    pub force_latest: bool,

    /// Never prompt; unresolved conflicts become an error.
    #[arg(long = "no-interaction", global = true)]
    pub no_interaction: bool,

    /// Project directory containing `gitsu.json` (defaults to the cwd).
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install the dependencies declared in `gitsu.json`.
    Install(RunArgs),
    /// Re-resolve and install, discarding any remembered conflict picks.
    Update(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Only install/update these logical package names.
    pub packages: Vec<String>,
}
