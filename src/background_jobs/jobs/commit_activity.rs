//! Commit activity polling job.
//!
//! Runs a watermark-driven collection for every watched repository. A failing
//! repository is logged and does not block the remaining ones; the job itself
//! reports failure when any repository failed.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, JobError},
};
use crate::config::WatchedRepo;
use std::time::Duration;
use tracing::{error, info};

pub struct CommitActivityJob {
    repos: Vec<WatchedRepo>,
    interval_minutes: u64,
}

impl CommitActivityJob {
    pub fn new(repos: Vec<WatchedRepo>, interval_minutes: u64) -> Self {
        Self {
            repos,
            interval_minutes,
        }
    }
}

impl BackgroundJob for CommitActivityJob {
    fn id(&self) -> &'static str {
        "commit_activity"
    }

    fn name(&self) -> &'static str {
        "Commit Activity"
    }

    fn description(&self) -> &'static str {
        "Poll GitHub for new commits in every watched repository"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let mut failures = 0;

        for watched in &self.repos {
            if ctx.is_cancelled() {
                return Err(JobError::Cancelled);
            }

            match ctx.collector.collect(&watched.repo, &watched.branch) {
                Ok(activity) => {
                    info!(
                        "Collected activity for {}: {}",
                        watched.repo,
                        serde_json::json!({
                            "committers": activity.commits_by_committer.len(),
                            "commits": activity
                                .commits_by_committer
                                .values()
                                .map(Vec::len)
                                .sum::<usize>(),
                            "latest": activity.latest_commit_at.map(|t| t.to_rfc3339()),
                        })
                    );
                }
                Err(e) => {
                    error!("{}", e);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            return Err(JobError::ExecutionFailed(format!(
                "{} of {} repositories failed",
                failures,
                self.repos.len()
            )));
        }
        Ok(())
    }
}
