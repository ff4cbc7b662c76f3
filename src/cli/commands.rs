//! CLI definition using clap.

use clap::Parser;
use std::path::PathBuf;

/// Parsegen - generate a statement parser for a target and keep the first one that matches
#[derive(Parser, Debug)]
#[command(name = "parsegen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target name; inputs are read from data/<target>/
    #[arg(short, long)]
    pub target: String,

    /// Project root holding data/, custom_parsers/ and output/
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the attempt budget
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_target_required() {
        assert!(Cli::try_parse_from(["parsegen"]).is_err());
    }

    #[test]
    fn test_minimal_args() {
        let cli = Cli::try_parse_from(["parsegen", "--target", "icici"]).unwrap();
        assert_eq!(cli.target, "icici");
        assert!(cli.root.is_none());
        assert!(cli.config.is_none());
        assert!(cli.max_attempts.is_none());
        assert!(!cli.json);
        assert!(!cli.is_verbose());
    }

    #[test]
    fn test_all_args() {
        let cli = Cli::try_parse_from([
            "parsegen",
            "-t",
            "sbi",
            "--root",
            "/work",
            "-c",
            "/etc/parsegen.yml",
            "--max-attempts",
            "5",
            "--json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.target, "sbi");
        assert_eq!(cli.root, Some(PathBuf::from("/work")));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/parsegen.yml")));
        assert_eq!(cli.max_attempts, Some(5));
        assert!(cli.json);
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(Cli::try_parse_from(["parsegen", "-t", "icici", "--max-attempts", "0"]).is_err());
    }
}
