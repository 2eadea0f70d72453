pub mod cleanup;

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::git::remote::{ensure_tracking_remote, tracking_remote_name, TrackingRemote};
use crate::git::{CommandRunner, Git, GitError};
use crate::pr::slug::suggest_branch_name;
use crate::pr::{JsonFetcher, PrClient, PrError, PullRequestMetadata};
use crate::repo::RepositoryRef;

#[derive(Debug, Error)]
pub enum PullError {
    #[error(transparent)]
    Metadata(#[from] PrError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Failed to read branch name: {0}")]
    Prompt(#[source] io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Options --branch and --suggest are mutually exclusive.")]
pub struct NamingConflict;

/// How the local branch gets its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchNaming {
    /// `pr-<number>`
    Default,
    /// Operator-supplied name
    Custom(String),
    /// Derived from the PR title, confirmed through a [`NamePrompt`]
    Suggest,
}

impl BranchNaming {
    /// Combine the `--branch` and `--suggest` flags. A blank custom name
    /// counts as absent.
    pub fn from_flags(branch: Option<&str>, suggest: bool) -> Result<Self, NamingConflict> {
        let custom = branch.map(str::trim).filter(|name| !name.is_empty());
        match (custom, suggest) {
            (Some(_), true) => Err(NamingConflict),
            (Some(name), false) => Ok(BranchNaming::Custom(name.to_string())),
            (None, true) => Ok(BranchNaming::Suggest),
            (None, false) => Ok(BranchNaming::Default),
        }
    }
}

/// Asks the operator to confirm or replace a suggested branch name.
pub trait NamePrompt {
    /// Show `suggestion` and return the raw answer. An empty answer keeps
    /// the suggestion.
    fn ask(&mut self, suggestion: &str) -> io::Result<String>;
}

/// Prompts on stdout and reads one line from stdin.
pub struct StdinPrompt;

impl NamePrompt for StdinPrompt {
    fn ask(&mut self, suggestion: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "Suggested branch name: {suggestion}")?;
        write!(stdout, "Press enter to use this name, or type a new one: ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer)
    }
}

/// Everything a pull needs, fixed before the first step runs.
#[derive(Debug, Clone)]
pub struct PullContext {
    pub repository: RepositoryRef,
    pub number: u64,
    /// `false` leaves the merge staged (`git pull --no-commit`)
    pub commit: bool,
    pub naming: BranchNaming,
}

/// What a successful pull left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub remote: TrackingRemote,
    pub branch: String,
    pub base_branch: String,
    pub head_branch: String,
}

/// Fetch, name, track, branch, pull. The first failing step ends the run;
/// whatever earlier steps created stays in place.
pub async fn run_pull<F, R>(
    ctx: &PullContext,
    client: &PrClient<F>,
    git: &Git<R>,
    prompt: &mut dyn NamePrompt,
) -> Result<PullOutcome, PullError>
where
    F: JsonFetcher,
    R: CommandRunner,
{
    let span = info_span!("pull", repo = %ctx.repository, pr = ctx.number);
    async move {
        info!("fetching pull request");
        let metadata = client.fetch_pull(&ctx.repository, ctx.number).await?;

        let branch = resolve_branch_name(ctx, &metadata, prompt)?;
        debug!(%branch, "resolved branch name");

        let remote = ensure_tracking_remote(git, ctx.number, &metadata.head_clone_url)?;
        create_branch(git, &branch, &metadata.base_branch)?;
        pull_changes(git, &remote.name, &metadata.head_branch, ctx.commit)?;
        info!(%branch, remote = %remote.name, "pull complete");

        Ok(PullOutcome {
            remote,
            branch,
            base_branch: metadata.base_branch,
            head_branch: metadata.head_branch,
        })
    }
    .instrument(span)
    .await
}

/// Explicit name, then the confirmed suggestion, then `pr-<number>`.
pub fn resolve_branch_name(
    ctx: &PullContext,
    metadata: &PullRequestMetadata,
    prompt: &mut dyn NamePrompt,
) -> Result<String, PullError> {
    match &ctx.naming {
        BranchNaming::Custom(name) => Ok(name.clone()),
        BranchNaming::Default => Ok(tracking_remote_name(ctx.number)),
        BranchNaming::Suggest => {
            let suggestion = suggest_branch_name(metadata.title.as_deref());
            let answer = prompt.ask(&suggestion).map_err(PullError::Prompt)?;
            let answer = answer.trim();
            Ok(if answer.is_empty() {
                suggestion
            } else {
                answer.to_string()
            })
        }
    }
}

/// `git checkout -b <branch> <base>`; fails if the branch exists.
pub fn create_branch<R: CommandRunner>(git: &Git<R>, branch: &str, base: &str) -> Result<(), GitError> {
    git.exec(&["checkout", "-b", branch, base], true)?;
    Ok(())
}

/// `git pull [--no-commit] --set-upstream <remote> <head>`
pub fn pull_changes<R: CommandRunner>(
    git: &Git<R>,
    remote: &str,
    head_branch: &str,
    commit: bool,
) -> Result<(), GitError> {
    let mut args = vec!["pull"];
    if !commit {
        args.push("--no-commit");
    }
    args.extend(["--set-upstream", remote, head_branch]);
    git.exec(&args, true)?;
    Ok(())
}
