use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One commit as seen by the collector.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub sha: String,
    pub authored_at: DateTime<Utc>,
    pub committed_at: DateTime<Utc>,
    /// Display name of the committer. Commits without one never enter the
    /// activity buckets.
    pub committer_name: Option<String>,
}

/// Which commit history a collection run walks after resolving the branch tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CommitScope {
    /// Only commits reachable from the resolved branch tip.
    Branch,
    /// The repository's default history, regardless of the resolved branch.
    Repository,
}

/// Result of one collection run.
#[derive(Debug, Clone, Default)]
pub struct CommitActivity {
    /// Committer display name to commit timestamps, in iteration order.
    pub commits_by_committer: HashMap<String, Vec<DateTime<Utc>>>,
    /// Newest commit timestamp observed across the full iteration, including
    /// commits that were filtered out of the buckets.
    pub latest_commit_at: Option<DateTime<Utc>>,
}
