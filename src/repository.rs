//! Source-control host lookups needed before any document is processed.
//!
//! Both lookups are fatal on failure: a submission without a repository URL
//! and commit id is meaningless.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use ureq::Agent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub html_url: String,
    pub default_branch: String,
    pub commit_id: String,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    html_url: String,
    default_branch: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
}

/// Client for the GitHub REST API.
pub struct GitHubClient {
    api_url: String,
    token: String,
    agent: Agent,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            agent,
        }
    }

    /// Resolve the repository URL, default branch, and its latest commit.
    pub fn repository_info(&self, repository: &str) -> Result<RepositoryInfo> {
        let repo: RepositoryResponse = self
            .get_json(&format!("{}/repos/{repository}", self.api_url))
            .context("fetch repository details")?;
        let commit: CommitResponse = self
            .get_json(&format!(
                "{}/repos/{repository}/commits/{}",
                self.api_url, repo.default_branch
            ))
            .context("fetch latest commit")?;
        tracing::info!(
            repository,
            branch = %repo.default_branch,
            commit = %commit.sha,
            "resolved repository"
        );
        Ok(RepositoryInfo {
            html_url: repo.html_url,
            default_branch: repo.default_branch,
            commit_id: commit.sha,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .call()
            .with_context(|| format!("GET {url}"))?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(anyhow!("GET {url} returned status {status}"));
        }
        response
            .body_mut()
            .read_json::<T>()
            .with_context(|| format!("parse JSON from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_trailing_slash_is_trimmed() {
        let client = GitHubClient::new("https://api.github.com/", "token");
        assert_eq!(client.api_url, "https://api.github.com");
    }

    #[test]
    fn unreachable_host_is_an_error() {
        let client = GitHubClient::new("http://127.0.0.1:9", "token");
        let err = client.repository_info("acme/plugins").unwrap_err();
        assert!(format!("{err:#}").contains("fetch repository details"));
    }
}
