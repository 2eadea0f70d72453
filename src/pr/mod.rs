pub mod slug;
pub mod types;

pub use types::{OpenPull, PullRequestMetadata};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::repo::RepositoryRef;
use types::PullResponse;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Could not read info from {url} (HTTP {status})")]
    Status { url: String, status: u16 },

    #[error("Nothing found at {url}")]
    NotFound { url: String },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("Could not find info for PR #{number} (maybe its source repo was deleted?)")]
    SourceMissing { number: u64 },
}

/// Fetches a JSON document by URL.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, PrError>;
}

/// Unauthenticated HTTPS transport with a fixed User-Agent.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn get_json(&self, url: &str) -> Result<Value, PrError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "received response");
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PrError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PrError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| PrError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Reads pull request data for one repository.
pub struct PrClient<F> {
    fetcher: F,
    api_base: String,
}

impl<F: JsonFetcher> PrClient<F> {
    pub fn new(fetcher: F, api_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
        }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn pull_url(&self, repo: &RepositoryRef, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, repo.owner, repo.name, number
        )
    }

    pub fn open_pulls_url(&self, repo: &RepositoryRef, per_page: u32) -> String {
        format!(
            "{}/repos/{}/{}/pulls?state=open&per_page={}",
            self.api_base, repo.owner, repo.name, per_page
        )
    }

    /// Fetch one PR. Its head clone URL, head ref and base ref must all be
    /// present, otherwise the source fork is assumed gone.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn fetch_pull(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<PullRequestMetadata, PrError> {
        let url = self.pull_url(repo, number);
        let value = self.fetcher.get_json(&url).await?;

        let pull: PullResponse = serde_json::from_value(value).map_err(|e| PrError::Malformed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let (Some(clone_url), Some(head_ref), Some(base_ref)) =
            (pull.head_clone_url(), pull.head_ref(), pull.base_ref())
        else {
            return Err(PrError::SourceMissing { number });
        };

        let metadata = PullRequestMetadata {
            number,
            title: pull.title.clone(),
            base_branch: base_ref.to_string(),
            head_clone_url: clone_url.to_string(),
            head_branch: head_ref.to_string(),
        };
        debug!(
            number = metadata.number,
            head = %metadata.head_branch,
            base = %metadata.base_branch,
            "received PR metadata"
        );
        Ok(metadata)
    }

    /// Fetch the first page of open PRs. No open PRs is an empty list.
    /// Every entry carrying a number is kept, whatever else it lacks.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn fetch_open_pulls(
        &self,
        repo: &RepositoryRef,
        per_page: u32,
    ) -> Result<Vec<OpenPull>, PrError> {
        let url = self.open_pulls_url(repo, per_page);
        let value = self.fetcher.get_json(&url).await?;

        if !value.is_array() {
            return Err(PrError::Malformed {
                url,
                reason: "expected a JSON array of pull requests".to_string(),
            });
        }

        let pulls: Vec<PullResponse> =
            serde_json::from_value(value).map_err(|e| PrError::Malformed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let open: Vec<OpenPull> = pulls
            .iter()
            .filter_map(|pull| {
                Some(OpenPull {
                    number: pull.number?,
                    title: pull.title.clone(),
                    head_repo_full_name: pull.head_full_name().map(str::to_string),
                    head_ref: pull.head_ref().map(str::to_string),
                })
            })
            .collect();
        debug!(count = open.len(), "received open PRs");
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pull_json, repository, FakeFetcher, FakeResponse};
    use serde_json::json;

    const PULL_URL: &str = "https://api.test/repos/octo/widgets/pulls/42";
    const OPEN_URL: &str = "https://api.test/repos/octo/widgets/pulls?state=open&per_page=100";

    fn pr_client(fetcher: FakeFetcher) -> PrClient<FakeFetcher> {
        PrClient::new(fetcher, "https://api.test")
    }

    #[tokio::test]
    async fn test_fetch_pull() {
        let fetcher = FakeFetcher::default().with(PULL_URL, FakeResponse::Json(pull_json(42, "Add login")));
        let client = pr_client(fetcher);
        let pull = client.fetch_pull(&repository(), 42).await.unwrap();
        assert_eq!(pull.title.as_deref(), Some("Add login"));
        assert_eq!(pull.base_branch, "main");
        assert_eq!(pull.head_branch, "feature/login");
        assert_eq!(pull.head_clone_url, "https://github.com/alice/widgets.git");
        assert_eq!(client.fetcher().requests(), vec![PULL_URL]);
    }

    #[tokio::test]
    async fn test_fetch_pull_with_deleted_fork() {
        let mut body = pull_json(42, "Add login");
        body["head"]["repo"] = Value::Null;
        let client = pr_client(FakeFetcher::default().with(PULL_URL, FakeResponse::Json(body)));
        let err = client.fetch_pull(&repository(), 42).await.unwrap_err();
        assert!(matches!(err, PrError::SourceMissing { number: 42 }));
        assert_eq!(
            err.to_string(),
            "Could not find info for PR #42 (maybe its source repo was deleted?)"
        );
    }

    #[tokio::test]
    async fn test_fetch_pull_missing_base_ref() {
        let mut body = pull_json(42, "Add login");
        body.as_object_mut().unwrap().remove("base");
        let client = pr_client(FakeFetcher::default().with(PULL_URL, FakeResponse::Json(body)));
        let err = client.fetch_pull(&repository(), 42).await.unwrap_err();
        assert!(matches!(err, PrError::SourceMissing { number: 42 }));
    }

    #[tokio::test]
    async fn test_fetch_pull_not_found() {
        let client = pr_client(FakeFetcher::default().with(PULL_URL, FakeResponse::NotFound));
        let err = client.fetch_pull(&repository(), 42).await.unwrap_err();
        assert!(matches!(err, PrError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_pull_malformed_body() {
        let client = pr_client(FakeFetcher::default().with(PULL_URL, FakeResponse::Json(json!(["nope"]))));
        let err = client.fetch_pull(&repository(), 42).await.unwrap_err();
        assert!(matches!(err, PrError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_open_pulls_empty() {
        let client = pr_client(FakeFetcher::default().with(OPEN_URL, FakeResponse::Json(json!([]))));
        let pulls = client.fetch_open_pulls(&repository(), 100).await.unwrap();
        assert!(pulls.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_open_pulls() {
        let mut deleted = pull_json(9, "Orphaned");
        deleted["head"]["repo"] = Value::Null;
        let body = json!([pull_json(7, "First"), deleted, {"number": 3}]);
        let client = pr_client(FakeFetcher::default().with(OPEN_URL, FakeResponse::Json(body)));

        let pulls = client.fetch_open_pulls(&repository(), 100).await.unwrap();
        assert_eq!(pulls.len(), 3);
        assert_eq!(pulls[0].number, 7);
        assert_eq!(pulls[0].head_repo_full_name.as_deref(), Some("alice/widgets"));
        assert_eq!(pulls[1].number, 9);
        assert_eq!(pulls[1].head_repo_full_name, None);
        assert_eq!(pulls[1].head_ref.as_deref(), Some("feature/login"));
        assert_eq!(pulls[2].number, 3);
        assert_eq!(pulls[2].title, None);
    }

    #[tokio::test]
    async fn test_fetch_open_pulls_skips_entries_without_number() {
        let body = json!([{"title": "No number"}, pull_json(5, "Kept")]);
        let client = pr_client(FakeFetcher::default().with(OPEN_URL, FakeResponse::Json(body)));

        let pulls = client.fetch_open_pulls(&repository(), 100).await.unwrap();
        let numbers: Vec<u64> = pulls.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![5]);
    }

    #[tokio::test]
    async fn test_fetch_open_pulls_error_is_not_empty() {
        let client = pr_client(FakeFetcher::default().with(OPEN_URL, FakeResponse::Status(403)));
        let err = client.fetch_open_pulls(&repository(), 100).await.unwrap_err();
        assert!(matches!(err, PrError::Status { status: 403, .. }));

        let client = pr_client(FakeFetcher::default().with(
            OPEN_URL,
            FakeResponse::Json(json!({"message": "API rate limit exceeded"})),
        ));
        let err = client.fetch_open_pulls(&repository(), 100).await.unwrap_err();
        assert!(matches!(err, PrError::Malformed { .. }));
    }
}
