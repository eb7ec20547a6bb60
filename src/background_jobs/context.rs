use crate::github::CommitActivityCollector;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context provided to jobs during execution.
#[derive(Clone)]
pub struct JobContext {
    /// Token to check for cancellation/shutdown requests.
    pub cancellation_token: CancellationToken,

    /// The commit activity collector, watermark handling included.
    pub collector: Arc<CommitActivityCollector>,
}

impl JobContext {
    pub fn new(
        cancellation_token: CancellationToken,
        collector: Arc<CommitActivityCollector>,
    ) -> Self {
        Self {
            cancellation_token,
            collector,
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
