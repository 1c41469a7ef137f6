//! Quay CLI - build Quay projects with the outline passes

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quay::util::diagnostic::ManifestParseError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        report(&e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = commands::GlobalArgs {
        verbose: cli.verbose,
        no_color: cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Init(args) => commands::init::execute(args),
        Commands::Build(args) => commands::build::execute(args, global),
        Commands::Check(args) => commands::check::execute(args, global),
        Commands::Tree(args) => commands::tree::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error; manifest syntax errors get a source snippet.
fn report(e: &anyhow::Error) {
    if let Some(parse_error) = e.downcast_ref::<ManifestParseError>() {
        let mut out = String::new();
        let handler = miette::GraphicalReportHandler::new();
        if handler.render_report(&mut out, parse_error).is_ok() {
            eprint!("{}", out);
            return;
        }
    }
    eprintln!("error: {:#}", e);
}
