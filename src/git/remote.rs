use tracing::{debug, info, instrument};

use super::{CommandRunner, Git, GitError};

const PREFIX: &str = "pr-";

/// Name of the remote tracking PR `number`.
pub fn tracking_remote_name(number: u64) -> String {
    format!("{PREFIX}{number}")
}

/// PR number encoded in a remote name, if the name is exactly `pr-<digits>`.
pub fn pr_number_of(remote: &str) -> Option<u64> {
    let digits = remote.strip_prefix(PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether the remote had to be added or already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChange {
    Added,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRemote {
    pub name: String,
    pub url: String,
    pub change: RemoteChange,
}

pub fn list_remotes<R: CommandRunner>(git: &Git<R>) -> Result<Vec<String>, GitError> {
    let lines = git.exec(&["remote"], false)?;
    Ok(lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Point `pr-<number>` at `clone_url`, adding the remote if needed.
/// Running it twice with the same inputs changes nothing the second time.
#[instrument(skip(git))]
pub fn ensure_tracking_remote<R: CommandRunner>(
    git: &Git<R>,
    number: u64,
    clone_url: &str,
) -> Result<TrackingRemote, GitError> {
    let name = tracking_remote_name(number);
    let exists = list_remotes(git)?.iter().any(|remote| *remote == name);

    let change = if exists {
        git.exec(&["remote", "set-url", name.as_str(), clone_url], true)?;
        RemoteChange::Updated
    } else {
        git.exec(&["remote", "add", name.as_str(), clone_url], true)?;
        RemoteChange::Added
    };
    info!(remote = %name, ?change, "tracking remote ready");

    Ok(TrackingRemote {
        name,
        url: clone_url.to_string(),
        change,
    })
}

pub fn remove_remote<R: CommandRunner>(git: &Git<R>, name: &str) -> Result<(), GitError> {
    debug!(remote = %name, "removing remote");
    git.exec(&["remote", "remove", name], true)?;
    Ok(())
}
