use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::git::{CommandRunner, Git, GitError};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Could not find Github owner and repo: remote '{remote}' is not configured")]
    NoRemote { remote: String },

    #[error("Could not find Github owner and repo in remote URL '{url}'")]
    UnrecognizedUrl { url: String },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// The `owner/name` pair of the hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Read the fetch URL of `remote` and parse it.
#[instrument(skip(git))]
pub fn locate<R: CommandRunner>(
    git: &Git<R>,
    remote: &str,
    host: &str,
) -> Result<RepositoryRef, LocateError> {
    let result = git.capture(&["remote", "get-url", remote])?;

    let url = result
        .lines
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .filter(|_| result.exited_cleanly())
        .ok_or_else(|| LocateError::NoRemote {
            remote: remote.to_string(),
        })?;

    let repository = parse_remote_url(url, host)?;
    debug!(%repository, "located repository");
    Ok(repository)
}

/// Extract owner and repo from `https://<host>/<owner>/<repo>[.git]` or
/// `git@<host>:<owner>/<repo>[.git]`.
///
/// The host must equal `host` (ASCII case-insensitive) and exactly two
/// non-empty path segments must follow it.
pub fn parse_remote_url(url: &str, host: &str) -> Result<RepositoryRef, LocateError> {
    let unrecognized = || LocateError::UnrecognizedUrl {
        url: url.to_string(),
    };

    let (url_host, path) = split_host_and_path(url).ok_or_else(unrecognized)?;
    if !url_host.eq_ignore_ascii_case(host) {
        return Err(unrecognized());
    }

    let path = path.as_str();
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();

    let [owner, repo] = segments[..] else {
        return Err(unrecognized());
    };
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if owner.is_empty() || repo.is_empty() {
        return Err(unrecognized());
    }

    Ok(RepositoryRef {
        owner: owner.to_string(),
        name: repo.to_string(),
    })
}

/// Host and path of a URL-style remote (`https://`, `ssh://`, ...) or of an
/// scp-style one (`[user@]host:path`). Local paths yield `None`.
fn split_host_and_path(url: &str) -> Option<(String, String)> {
    if url.contains("://") {
        let parsed = reqwest::Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_string();
        return Some((host, parsed.path().to_string()));
    }

    let (authority, path) = url.split_once(':')?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.is_empty() || host.contains('/') || path.starts_with('/') {
        return None;
    }
    Some((host.to_string(), path.to_string()))
}
