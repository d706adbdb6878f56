//! git-stamp — embed the current git short hash in a firmware header
//!
//! Usage:
//!   git-stamp                      — regenerate include/git_version.h if the hash changed
//!   git-stamp check --json         — report whether the header is stale, write nothing
//!   git-stamp show                 — print the resolved revision
//!
//! Meant to run as a pre-build step; the build profile comes from `PIOENV`.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use persistence::{CacheRecord, HeaderArtifact, DEFAULT_CACHE_PATH, DEFAULT_HEADER_PATH};
use stamper::{FixedRevision, GitCli, RevisionSource, StampOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "git-stamp", version = APP_VERSION)]
#[command(about = "Embed the current git short hash in a generated C header", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    stamp: StampArgs,

    /// Defaults to `stamp`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct StampArgs {
    /// Cache record holding the last written hash
    #[arg(long, global = true, env = "GIT_STAMP_CACHE", default_value = DEFAULT_CACHE_PATH)]
    cache: PathBuf,

    /// Generated header path
    #[arg(long, global = true, env = "GIT_STAMP_HEADER", default_value = DEFAULT_HEADER_PATH)]
    header: PathBuf,

    /// Use this revision instead of querying git
    #[arg(long, global = true, env = "GIT_STAMP_REVISION")]
    revision: Option<String>,

    /// Run git inside this directory
    #[arg(long, global = true, env = "GIT_STAMP_REPO")]
    repo: Option<PathBuf>,

    /// Stop git's repository discovery below this directory
    #[arg(long, global = true, env = "GIT_STAMP_CEILING")]
    ceiling: Option<PathBuf>,

    /// Build profile that triggered the step (reported only)
    #[arg(long, global = true, env = "PIOENV")]
    profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the header when the hash changed
    Stamp {
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report whether the header is stale without writing (exit 1 if stale)
    Check {
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved current revision
    Show,
}

impl Cli {
    /// Commands whose stdout is meant for machines
    fn machine_output(&self) -> bool {
        matches!(
            self.command,
            Some(Commands::Stamp { json: true })
                | Some(Commands::Check { json: true })
                | Some(Commands::Show)
        )
    }
}

fn init_logging(verbose: bool, to_stderr: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,stamper=debug,persistence=debug,git_stamp=debug")
    } else {
        EnvFilter::new("info,stamper=info,persistence=info,git_stamp=info")
    };

    let layer = fmt::layer().with_target(false).compact();
    if to_stderr {
        tracing_subscriber::registry()
            .with(layer.with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(layer).with(filter).init();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    // .env first so its values back the env fallbacks of the arguments
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.machine_output());

    Ok(if run(&cli)? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Returns `false` when the command should exit non-zero without an error
/// (a stale header under `check`).
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let source = revision_source(&cli.stamp)?;
    let cache = CacheRecord::new(&cli.stamp.cache);
    let header = HeaderArtifact::new(&cli.stamp.header);

    match cli.command {
        None => cmd_stamp(&cli.stamp, source.as_ref(), &cache, &header, false),
        Some(Commands::Stamp { json }) => {
            cmd_stamp(&cli.stamp, source.as_ref(), &cache, &header, json)
        }
        Some(Commands::Check { json }) => cmd_check(source.as_ref(), &cache, &header, json),
        Some(Commands::Show) => {
            println!("{}", stamper::resolve_revision(source.as_ref()));
            Ok(true)
        }
    }
}

fn revision_source(args: &StampArgs) -> anyhow::Result<Box<dyn RevisionSource>> {
    if let Some(revision) = &args.revision {
        let fixed = FixedRevision::new(revision)
            .with_context(|| format!("Invalid --revision value {revision:?}"))?;
        return Ok(Box::new(fixed));
    }
    let git = match &args.repo {
        Some(dir) => GitCli::in_dir(dir),
        None => GitCli::new(),
    };
    Ok(match &args.ceiling {
        Some(ceiling) => Box::new(git.with_ceiling(ceiling)),
        None => Box::new(git),
    })
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_stamp(
    args: &StampArgs,
    source: &dyn RevisionSource,
    cache: &CacheRecord,
    header: &HeaderArtifact,
    json: bool,
) -> anyhow::Result<bool> {
    info!(
        profile = args.profile.as_deref().unwrap_or("default"),
        "Updating git hash in header file..."
    );

    let outcome = stamper::stamp(source, cache, header).context("Failed to stamp git hash")?;
    if json {
        print_json(&outcome)?;
    }
    Ok(true)
}

fn cmd_check(
    source: &dyn RevisionSource,
    cache: &CacheRecord,
    header: &HeaderArtifact,
    json: bool,
) -> anyhow::Result<bool> {
    let outcome = stamper::check(source, cache, header).context("Failed to check git hash")?;

    if json {
        print_json(&outcome)?;
    } else if outcome.stale {
        info!(
            hash = %outcome.revision,
            previous = outcome.previous.as_deref().unwrap_or("<none>"),
            "{} is stale",
            outcome.header_path.display()
        );
    } else {
        info!(hash = %outcome.revision, "{} is up to date", outcome.header_path.display());
    }

    Ok(!outcome.stale)
}

fn print_json(outcome: &StampOutcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}
