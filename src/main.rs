use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gitversion::config;
use gitversion::domain::{VersionBump, Workflow};
use gitversion::git::Git2Repository;
use gitversion::output::{self, OutputFormat};
use gitversion::VersionCalculator;

#[derive(Parser, Debug)]
#[command(
    name = "gitversion",
    version,
    about = "Calculate a semantic version from git history, tags and branch names"
)]
struct Args {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, help = "Output format")]
    output: OutputFormat,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Branch to version instead of the checked out one")]
    branch: Option<String>,

    #[arg(short, long, value_enum, help = "Branching workflow [default: from configuration]")]
    workflow: Option<Workflow>,

    #[arg(long, group = "force", help = "Force a major increment")]
    major: bool,

    #[arg(long, group = "force", help = "Force a minor increment")]
    minor: bool,

    #[arg(long, group = "force", help = "Force a patch increment")]
    patch: bool,

    #[arg(long, help = "Use this version as the next version")]
    next_version: Option<String>,

    #[arg(long, default_value = ".", help = "Path inside the repository")]
    path: PathBuf,

    #[arg(short, long, help = "Log resolution details to stderr")]
    verbose: bool,
}

impl Args {
    fn forced_increment(&self) -> Option<VersionBump> {
        if self.major {
            Some(VersionBump::Major)
        } else if self.minor {
            Some(VersionBump::Minor)
        } else if self.patch {
            Some(VersionBump::Patch)
        } else {
            None
        }
    }
}

fn debug_requested() -> bool {
    std::env::var("DEBUG")
        .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
        .unwrap_or(false)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "gitversion=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config_path = args
        .config
        .clone()
        .or_else(|| config::discover_config(&args.path));
    let config =
        config::load_config(config_path.as_deref()).context("failed to load configuration")?;
    let workflow = args.workflow.unwrap_or(config.workflow);
    debug!(path = %args.path.display(), %workflow, "starting resolution");

    let repo = Git2Repository::open(&args.path)?;
    let calculator = VersionCalculator::new(repo, config);
    let resolved = calculator.resolve(
        args.branch.as_deref(),
        workflow,
        args.forced_increment(),
        args.next_version.as_deref(),
    )?;

    println!("{}", output::format(&resolved, args.output)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose || debug_requested());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_force_flags_are_exclusive() {
        let result = Args::try_parse_from(["gitversion", "--major", "--minor"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_full_invocation() {
        let args = Args::try_parse_from([
            "gitversion",
            "-o",
            "json",
            "-b",
            "release/1.0.0",
            "-w",
            "githubflow",
            "--minor",
            "--next-version",
            "2.0.0",
        ])
        .unwrap();

        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.branch.as_deref(), Some("release/1.0.0"));
        assert_eq!(args.workflow, Some(Workflow::GitHubFlow));
        assert_eq!(args.forced_increment(), Some(VersionBump::Minor));
        assert_eq!(args.next_version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["gitversion"]).unwrap();
        assert_eq!(args.output, OutputFormat::Text);
        assert_eq!(args.workflow, None);
        assert_eq!(args.forced_increment(), None);
        assert_eq!(args.path, PathBuf::from("."));
    }
}
