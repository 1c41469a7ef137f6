//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Quay - a retargetable multi-pass compiler toolchain
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "QUAY_NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a Quay project in a new or existing directory
    Init(InitArgs),

    /// Build the current project
    Build(BuildArgs),

    /// Analyze the current project without generating code
    Check(CheckArgs),

    /// Display the project's packages, modules and snippets
    Tree(TreeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name (defaults to directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Stop after semantic analysis
    #[arg(long)]
    pub semantic_only: bool,

    /// Link mode (default, require-complete, skip)
    #[arg(long)]
    pub link: Option<String>,

    /// Stop after IR generation
    #[arg(long)]
    pub no_codegen: bool,

    /// Write package digests to the target directory
    #[arg(long)]
    pub digests: bool,

    /// Message format (human, json)
    #[arg(long)]
    pub message_format: Option<String>,

    /// Write assembly listings and the link map to this directory
    #[arg(long, value_name = "DIR")]
    pub emit: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Message format (human, json)
    #[arg(long)]
    pub message_format: Option<String>,

    /// Also write package digests
    #[arg(long)]
    pub digests: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Show modules and snippets under each package
    #[arg(long)]
    pub snippets: bool,

    /// List packages in dependency order instead of declaration order
    #[arg(long)]
    pub dependency_order: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
