// src/config.rs
// =============================================================================
// The options a checking run is configured with.
//
// The CLI (src/cli.rs) fills one of these in from command-line flags, but the
// library only ever sees this struct, so tests and other front ends can build
// it directly with struct-update syntax:
//
//   CheckOptions { local_only: true, ..CheckOptions::new("docs") }
// =============================================================================

use std::path::PathBuf;

/// File name looked up under the crawl root when no exclusions file is given.
pub const DEFAULT_EXCLUSIONS_FILE: &str = ".unbroken_exclusions";

/// User-Agent sent with every web request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Chrome/89.0.4346.0";

#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Directory to crawl
    pub dir: PathBuf,
    /// Exclusions/suppressions file; `None` means `<dir>/.unbroken_exclusions`
    pub exclusions: Option<PathBuf>,
    /// Do not check http:// and https:// links at all
    pub local_only: bool,
    /// Accept `#L123`-style anchors on links to local files
    pub allow_local_line_sections: bool,
    /// Suppress informational logs
    pub quiet: bool,
    /// Suppress error logs too (implies quiet)
    pub superquiet: bool,
    /// Override the outbound User-Agent header
    pub user_agent: Option<String>,
    /// Scan front matter `id:` fields before validating
    pub parse_ids: bool,
}

impl CheckOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// The exclusions file to load, and whether the user asked for it
    /// explicitly (a missing explicit file is fatal, a missing default is not).
    pub fn exclusions_path(&self) -> (PathBuf, bool) {
        match &self.exclusions {
            Some(path) => (path.clone(), true),
            None => (self.dir.join(DEFAULT_EXCLUSIONS_FILE), false),
        }
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet || self.superquiet
    }

    /// The tracing filter directive matching the quiet flags.
    pub fn log_directive(&self) -> &'static str {
        if self.superquiet {
            "off"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            exclusions: None,
            local_only: false,
            allow_local_line_sections: false,
            quiet: false,
            superquiet: false,
            user_agent: None,
            parse_ids: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_exclusions_file_lives_under_dir() {
        let options = CheckOptions::new("docs");
        let (path, explicit) = options.exclusions_path();
        assert_eq!(path, Path::new("docs").join(".unbroken_exclusions"));
        assert!(!explicit);
    }

    #[test]
    fn test_explicit_exclusions_file() {
        let options = CheckOptions {
            exclusions: Some(PathBuf::from("rules.txt")),
            ..CheckOptions::default()
        };
        assert_eq!(options.exclusions_path(), (PathBuf::from("rules.txt"), true));
    }

    #[test]
    fn test_superquiet_implies_quiet() {
        let options = CheckOptions {
            superquiet: true,
            ..CheckOptions::default()
        };
        assert!(options.is_quiet());
        assert_eq!(options.log_directive(), "off");
        assert_eq!(CheckOptions::default().log_directive(), "info");
    }

    #[test]
    fn test_user_agent_override() {
        assert_eq!(CheckOptions::default().user_agent(), DEFAULT_USER_AGENT);
        let options = CheckOptions {
            user_agent: Some("unbroken-test".to_string()),
            ..CheckOptions::default()
        };
        assert_eq!(options.user_agent(), "unbroken-test");
    }
}
