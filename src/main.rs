// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Handle --init, which doesn't check anything
// 3. Set up logging according to --quiet / --superquiet
// 4. Run the checker over the directory and print a summary
// 5. Exit with proper code (0 = no errors, 1 = broken links, 2 = fatal error)
// =============================================================================

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use unbroken::config::DEFAULT_EXCLUSIONS_FILE;
use unbroken::{CheckOptions, Checker};

/// What `--init` writes.
const DEFAULT_EXCLUSIONS: &str = "!node_modules";

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no unsuppressed findings
//   Ok(1) = broken links found
//   Err   = the run couldn't happen at all
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if cli.init {
        init_exclusions_file(Path::new(DEFAULT_EXCLUSIONS_FILE))?;
        return Ok(0);
    }

    let options = cli.to_options();
    init_logging(&options);

    let checker = Checker::new(options).context("Failed to set up the checker")?;

    let report = checker.run(None).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.log();
        let total = report.error_count() + report.warning_count();
        if total > 0 && !checker.options().superquiet {
            println!("{} errors, {} warnings.", report.error_count(), report.warning_count());
        }
    }

    Ok(if report.error_count() > 0 { 1 } else { 0 })
}

fn init_logging(options: &CheckOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn init_exclusions_file(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(path, DEFAULT_EXCLUSIONS)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}
