mod config;
mod git;
mod pr;
mod repo;
mod report;
mod workflow;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use git::{Git, GitError, SystemGit};
use pr::{HttpFetcher, PrClient};
use workflow::cleanup::{cleanup_stale_remotes, CleanupError};
use workflow::{BranchNaming, NamingConflict, PullContext, PullError, StdinPrompt};

const EXAMPLES: &str = "\
Examples:
  git pr 1337
  git pr --nocommit 1337
  git pr -b \"feature-fix\" 1337
  git pr -s 1337
  git pr -l
  git pr -c";

/// git-pr: easily pull the content of pull request #PR_NUM into a new branch.
#[derive(Parser, Debug)]
#[command(
    name = "git-pr",
    about,
    disable_version_flag = true,
    after_help = EXAMPLES
)]
struct Cli {
    /// Number of the pull request to pull; must be the only trailing argument
    #[arg(value_name = "PR_NUM")]
    pr: Vec<String>,

    /// Pull the given PR but don't commit the changes
    #[arg(short = 'n', long = "nocommit", visible_alias = "no-commit")]
    no_commit: bool,

    /// Custom local PR branch name (defaults to "pr-PR_NUM")
    #[arg(short, long, value_name = "BRANCH")]
    branch: Option<String>,

    /// Suggest a local branch name based on the PR title
    #[arg(short, long)]
    suggest: bool,

    /// List the open pull requests of the current repo
    #[arg(short, long)]
    list: bool,

    /// Remove remotes of PRs that are no longer open
    #[arg(short, long)]
    cleanup: bool,

    /// Display the version number
    #[arg(short = 'v', long)]
    version: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Naming(#[from] NamingConflict),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Locate(#[from] repo::LocateError),

    #[error(transparent)]
    Pull(#[from] PullError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Failed to print help: {0}")]
    Help(#[source] std::io::Error),
}

impl AppError {
    fn git(&self) -> Option<&GitError> {
        match self {
            AppError::Git(err) | AppError::Pull(PullError::Git(err)) => Some(err),
            AppError::Locate(repo::LocateError::Git(err)) => Some(err),
            _ => None,
        }
    }
}

/// What one invocation does, by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Cleanup,
    List,
    Version,
    Help,
    Pull(u64),
}

impl Action {
    fn from_cli(cli: &Cli) -> Action {
        if cli.cleanup {
            Action::Cleanup
        } else if cli.list {
            Action::List
        } else if cli.version {
            Action::Version
        } else {
            match parse_pr_argument(&cli.pr) {
                Some(number) => Action::Pull(number),
                None => Action::Help,
            }
        }
    }
}

/// Help and version requests are the only parse "errors" that succeed.
fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

/// A PR number is exactly one trailing argument made only of digits, and
/// greater than zero.
fn parse_pr_argument(args: &[String]) -> Option<u64> {
    let [arg] = args else {
        return None;
    };
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    arg.parse().ok().filter(|number| *number > 0)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if let Err(io) = err.print() {
                report::print_error(&format!("Failed to print usage: {io}"));
            }
            return if is_informational(&err) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::print_error(&err.to_string());
            if err.git().is_some_and(GitError::is_suspected_false_positive) {
                report::print_error(
                    "Note: git itself exited successfully; the matched output may be harmless.",
                );
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let naming = BranchNaming::from_flags(cli.branch.as_deref(), cli.suggest)?;

    let action = Action::from_cli(&cli);
    debug!(?action, ?naming, "resolved action");

    match action {
        Action::Version => {
            println!("git-pr version {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Action::Help => {
            Cli::command().print_help().map_err(AppError::Help)?;
            return Ok(());
        }
        _ => {}
    }

    info!("loading configuration");
    let config = config::Config::load()?;

    let git = Git::new(SystemGit::new(config.git.program.as_str()));
    let repository = repo::locate(&git, &config.git.origin, &config.github.host)?;
    let _main_span = info_span!("git_pr", repo = %repository).entered();

    let client = PrClient::new(
        HttpFetcher::new(config.github.user_agent.as_str()),
        config.api_base(),
    );

    match action {
        Action::Cleanup => {
            match cleanup_stale_remotes(&repository, &client, &git, config.github.per_page).await {
                Ok(cleanup) => {
                    info!(
                        kept = cleanup.kept_count(),
                        removed = cleanup.removed_count(),
                        "cleanup complete"
                    );
                    report::print_cleanup(&cleanup);
                }
                Err(CleanupError::Metadata(err)) => {
                    warn!(error = %err, "cleanup aborted");
                    report::print_error(&format!("Error: {}", CleanupError::Metadata(err)));
                }
                Err(CleanupError::Git(err)) => return Err(err.into()),
            }
        }
        Action::List => match client.fetch_open_pulls(&repository, config.github.per_page).await {
            Ok(pulls) => report::print_open_pulls(&pulls),
            Err(err) => {
                warn!(error = %err, "listing failed");
                report::print_error(&format!("Error: Could not fetch PR list from GitHub API: {err}"));
            }
        },
        Action::Pull(number) => {
            let ctx = PullContext {
                repository,
                number,
                commit: !cli.no_commit,
                naming,
            };
            let outcome = workflow::run_pull(&ctx, &client, &git, &mut StdinPrompt).await?;
            report::print_pull_summary(&outcome, ctx.commit);
        }
        Action::Version | Action::Help => {}
    }

    Ok(())
}
