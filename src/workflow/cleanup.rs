use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::git::remote::{list_remotes, pr_number_of, remove_remote};
use crate::git::{CommandRunner, Git, GitError};
use crate::pr::{JsonFetcher, PrClient, PrError};
use crate::repo::RepositoryRef;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Could not fetch PR list from GitHub API: {0}")]
    Metadata(#[from] PrError),

    #[error(transparent)]
    Git(#[from] GitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFate {
    Kept,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutcome {
    pub remote: String,
    pub number: u64,
    pub fate: RemoteFate,
}

/// One outcome per `pr-<number>` remote, in `git remote` order.
/// No outcomes means there was nothing to reconcile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub outcomes: Vec<RemoteOutcome>,
}

impl CleanupReport {
    pub fn removed_count(&self) -> usize {
        self.count(RemoteFate::Removed)
    }

    pub fn kept_count(&self) -> usize {
        self.count(RemoteFate::Kept)
    }

    fn count(&self, fate: RemoteFate) -> usize {
        self.outcomes.iter().filter(|o| o.fate == fate).count()
    }
}

/// Diff local PR remotes against a single fresh snapshot of open PRs and
/// remove the ones that are gone. Without PR remotes no API call is made.
/// If the snapshot can't be fetched nothing is removed.
#[instrument(skip(repo, client, git), fields(repo = %repo))]
pub async fn cleanup_stale_remotes<F, R>(
    repo: &RepositoryRef,
    client: &PrClient<F>,
    git: &Git<R>,
    per_page: u32,
) -> Result<CleanupReport, CleanupError>
where
    F: JsonFetcher,
    R: CommandRunner,
{
    let candidates: Vec<(String, u64)> = list_remotes(git)?
        .into_iter()
        .filter_map(|remote| pr_number_of(&remote).map(|number| (remote, number)))
        .collect();

    if candidates.is_empty() {
        debug!("no PR remotes");
        return Ok(CleanupReport::default());
    }

    let open: HashSet<u64> = client
        .fetch_open_pulls(repo, per_page)
        .await?
        .into_iter()
        .map(|pull| pull.number)
        .collect();
    debug!(candidates = candidates.len(), open = open.len(), "reconciling remotes");

    let mut report = CleanupReport::default();
    for (remote, number) in candidates {
        let fate = if open.contains(&number) {
            RemoteFate::Kept
        } else {
            remove_remote(git, &remote)?;
            RemoteFate::Removed
        };
        info!(%remote, ?fate, "reconciled remote");
        report.outcomes.push(RemoteOutcome {
            remote,
            number,
            fate,
        });
    }

    Ok(report)
}
