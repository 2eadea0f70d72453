use serde::Deserialize;

/// What a pull needs to know about one PR.
/// Built from the single-PR endpoint once the required head/base fields
/// have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestMetadata {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title, if the API returned one
    pub title: Option<String>,
    /// Branch the PR targets
    pub base_branch: String,
    /// Clone URL of the PR's source repository
    pub head_clone_url: String,
    /// Branch on the source repository holding the changes
    pub head_branch: String,
}

/// One entry of the open PR listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPull {
    pub number: u64,
    pub title: Option<String>,
    /// `owner/repo` of the source fork; `None` once the fork is deleted
    pub head_repo_full_name: Option<String>,
    pub head_ref: Option<String>,
}

// Wire shapes. Every field is optional so that a missing or null value
// surfaces as a domain error instead of a serde failure.

#[derive(Debug, Deserialize)]
pub(crate) struct PullResponse {
    pub number: Option<u64>,
    pub title: Option<String>,
    pub head: Option<HeadResponse>,
    pub base: Option<BaseResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HeadResponse {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub repo: Option<RepoResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoResponse {
    pub clone_url: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BaseResponse {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}

impl PullResponse {
    pub fn head_clone_url(&self) -> Option<&str> {
        self.head.as_ref()?.repo.as_ref()?.clone_url.as_deref()
    }

    pub fn head_full_name(&self) -> Option<&str> {
        self.head.as_ref()?.repo.as_ref()?.full_name.as_deref()
    }

    pub fn head_ref(&self) -> Option<&str> {
        self.head.as_ref()?.git_ref.as_deref()
    }

    pub fn base_ref(&self) -> Option<&str> {
        self.base.as_ref()?.git_ref.as_deref()
    }
}
