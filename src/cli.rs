// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The CLI is deliberately thin: every flag maps onto a field of
// CheckOptions, and the library does the rest. The only things handled here
// are the ones that aren't part of a checking run (--init, --json).
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

use unbroken::CheckOptions;

#[derive(Parser, Debug)]
#[command(
    name = "unbroken",
    version,
    about = "No more broken links in markdown!",
    long_about = "unbroken checks every markdown file under a directory for broken links to \
                  local files, to sections within documents, and to web pages. \
                  It's perfect for CI pipelines to keep documentation healthy."
)]
pub struct Cli {
    /// The directory to crawl
    #[arg(default_value = ".", value_name = "DIRECTORY")]
    pub dir: PathBuf,

    /// The exclusions file. Default is <DIRECTORY>/.unbroken_exclusions
    #[arg(short, long, value_name = "FILE")]
    pub exclusions: Option<PathBuf>,

    /// Do not test http and https links
    #[arg(short, long)]
    pub local_only: bool,

    /// Allow links to local files to have line sections like foo.cpp#L12
    #[arg(short, long)]
    pub allow_local_line_sections: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print nothing but the JSON report, if requested
    #[arg(short, long)]
    pub superquiet: bool,

    /// Allow links to point at Docusaurus-style front-matter ids
    #[arg(long)]
    pub parse_ids: bool,

    /// The User-Agent string to use for web requests
    #[arg(short, long, value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Create a default exclusions file if one doesn't already exist
    #[arg(short, long)]
    pub init: bool,

    /// Output the findings in JSON format instead of log lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn to_options(&self) -> CheckOptions {
        CheckOptions {
            dir: self.dir.clone(),
            exclusions: self.exclusions.clone(),
            local_only: self.local_only,
            allow_local_line_sections: self.allow_local_line_sections,
            quiet: self.quiet,
            superquiet: self.superquiet,
            user_agent: self.user_agent.clone(),
            parse_ids: self.parse_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["unbroken"]);
        let options = cli.to_options();
        assert_eq!(options.dir, PathBuf::from("."));
        assert!(!options.local_only);
        assert!(options.exclusions.is_none());
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::parse_from([
            "unbroken", "docs", "-l", "-a", "-q", "--parse-ids", "-e", "rules.txt", "-u", "bot/1.0",
        ]);
        let options = cli.to_options();
        assert_eq!(options.dir, PathBuf::from("docs"));
        assert!(options.local_only);
        assert!(options.allow_local_line_sections);
        assert!(options.quiet);
        assert!(options.parse_ids);
        assert_eq!(options.exclusions, Some(PathBuf::from("rules.txt")));
        assert_eq!(options.user_agent(), "bot/1.0");
    }
}
