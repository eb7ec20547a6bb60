//! GitHub REST client for commit listing.
//!
//! Only the two calls the collector needs: branch-ref resolution and commit
//! enumeration. The access token is injected, never baked in.

use super::models::CommitInfo;
use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const GITHUB_API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

/// The commit-listing provider the collector runs against. Kept narrow so
/// tests can substitute an in-memory host.
pub trait CommitHost: Send + Sync {
    /// Resolves a branch to its tip commit sha.
    fn branch_tip(&self, repo: &str, branch: &str) -> Result<String>;

    /// Lists commits of the repository. `start` is the sha to walk history
    /// from; `None` walks the repository's default history.
    fn list_commits(&self, repo: &str, start: Option<&str>) -> Result<Vec<CommitInfo>>;
}

pub struct GithubClient {
    client: Client,
    token: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Deserialize)]
struct CommitEntry {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: Option<CommitIdentity>,
    committer: Option<CommitIdentity>,
}

#[derive(Deserialize)]
struct CommitIdentity {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl GithubClient {
    pub fn new(token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("crewline-server/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()?;

        if !response.status().is_success() {
            anyhow::bail!("GitHub API failed with status {}", response.status());
        }

        Ok(response.json()?)
    }

    fn entry_to_commit(entry: CommitEntry) -> Option<CommitInfo> {
        let authored_at = entry.commit.author.as_ref()?.date?;
        let committer = entry.commit.committer?;
        let committed_at = committer.date?;
        Some(CommitInfo {
            sha: entry.sha,
            authored_at,
            committed_at,
            committer_name: committer.name.filter(|n| !n.is_empty()),
        })
    }
}

impl CommitHost for GithubClient {
    fn branch_tip(&self, repo: &str, branch: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/git/ref/heads/{}",
            GITHUB_API_BASE, repo, branch
        );
        let body: RefResponse = self.get_json(&url)?;
        Ok(body.object.sha)
    }

    fn list_commits(&self, repo: &str, start: Option<&str>) -> Result<Vec<CommitInfo>> {
        let mut commits = Vec::new();
        let mut page = 1;

        loop {
            let mut url = format!(
                "{}/repos/{}/commits?per_page={}&page={}",
                GITHUB_API_BASE, repo, PER_PAGE, page
            );
            if let Some(sha) = start {
                url.push_str(&format!("&sha={}", sha));
            }

            let body: Vec<CommitEntry> = self.get_json(&url)?;
            let page_len = body.len();
            commits.extend(body.into_iter().filter_map(Self::entry_to_commit));

            if page_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }
}
