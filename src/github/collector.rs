//! Commit activity collection.
//!
//! One blocking external call sequence per run, no internal retries. Runs for
//! the same repository are serialized through an in-process lock map so the
//! watermark cannot be torn by concurrent runs.

use super::client::CommitHost;
use super::models::{CommitActivity, CommitScope};
use crate::state_store::StateStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// State-store key holding the newest commit timestamp seen for a repository.
pub fn watermark_key(repo: &str) -> String {
    format!("lastCommitSeen-{}", repo)
}

/// The single failure condition of a collection run: any transport or auth
/// error collapses into this, with no distinction between them and no partial
/// results.
#[derive(Debug, Error)]
#[error("Commit collection for {repo} failed: {cause}")]
pub struct CollectionFailed {
    pub repo: String,
    pub cause: anyhow::Error,
}

pub struct CommitActivityCollector {
    host: Arc<dyn CommitHost>,
    state_store: Arc<dyn StateStore>,
    scope: CommitScope,
    repo_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CommitActivityCollector {
    pub fn new(
        host: Arc<dyn CommitHost>,
        state_store: Arc<dyn StateStore>,
        scope: CommitScope,
    ) -> Self {
        Self {
            host,
            state_store,
            scope,
            repo_locks: Mutex::new(HashMap::new()),
        }
    }

    fn repo_lock(&self, repo: &str) -> Arc<Mutex<()>> {
        let mut locks = self.repo_locks.lock().unwrap();
        locks
            .entry(repo.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn failed(&self, repo: &str, cause: anyhow::Error) -> CollectionFailed {
        CollectionFailed {
            repo: repo.to_string(),
            cause,
        }
    }

    /// Collects commits authored strictly after `since`, grouped by committer
    /// display name. Commits without a committer identity are skipped
    /// entirely; the newest commit timestamp is tracked across the full
    /// iteration regardless of filtering.
    pub fn collect_since(
        &self,
        repo: &str,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<CommitActivity, CollectionFailed> {
        let tip = self
            .host
            .branch_tip(repo, branch)
            .map_err(|cause| self.failed(repo, cause))?;
        let start = match self.scope {
            CommitScope::Branch => Some(tip.as_str()),
            CommitScope::Repository => None,
        };

        let commits = self
            .host
            .list_commits(repo, start)
            .map_err(|cause| self.failed(repo, cause))?;

        let mut activity = CommitActivity::default();
        for commit in &commits {
            if commit.authored_at > since {
                if let Some(name) = &commit.committer_name {
                    activity
                        .commits_by_committer
                        .entry(name.clone())
                        .or_default()
                        .push(commit.committed_at);
                }
            }
            if activity
                .latest_commit_at
                .map_or(true, |latest| commit.committed_at > latest)
            {
                activity.latest_commit_at = Some(commit.committed_at);
            }
        }

        debug!(
            "Collected {} commit(s) from {} committer(s) in {} since {}",
            activity
                .commits_by_committer
                .values()
                .map(Vec::len)
                .sum::<usize>(),
            activity.commits_by_committer.len(),
            repo,
            since.to_rfc3339()
        );
        Ok(activity)
    }

    /// Watermark-driven collection: reads the repository watermark (absent or
    /// unparseable falls back to the Unix epoch), collects strictly-after
    /// commits, then persists the newest commit timestamp as the next
    /// watermark. Serialized per repository.
    pub fn collect(&self, repo: &str, branch: &str) -> Result<CommitActivity, CollectionFailed> {
        let lock = self.repo_lock(repo);
        let _guard = lock.lock().unwrap();

        let since = self
            .state_store
            .get_state(&watermark_key(repo))
            .map_err(|cause| self.failed(repo, cause))?
            .and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
            .map(|value| value.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let activity = self.collect_since(repo, branch, since)?;

        if let Some(latest) = activity.latest_commit_at {
            self.state_store
                .set_state(&watermark_key(repo), &latest.to_rfc3339())
                .map_err(|cause| self.failed(repo, cause))?;
            info!(
                "Advanced commit watermark of {} to {}",
                repo,
                latest.to_rfc3339()
            );
        }

        Ok(activity)
    }
}
