use super::context::JobContext;
use super::job::{BackgroundJob, JobError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawns one interval loop per registered job.
///
/// Each loop runs the job body on the blocking pool, then sleeps until the
/// next tick or until the context's cancellation token fires.
pub struct BackgroundJobRunner {
    context: JobContext,
    jobs: Vec<Arc<dyn BackgroundJob>>,
}

impl BackgroundJobRunner {
    pub fn new(context: JobContext) -> Self {
        Self {
            context,
            jobs: Vec::new(),
        }
    }

    pub fn register(&mut self, job: Arc<dyn BackgroundJob>) {
        info!(
            "Registered background job {} ({}), every {:?}",
            job.id(),
            job.description(),
            job.interval()
        );
        self.jobs.push(job);
    }

    pub fn spawn_all(self) -> Vec<JoinHandle<()>> {
        let context = self.context;
        self.jobs
            .into_iter()
            .map(|job| {
                let ctx = context.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(job.interval());
                    loop {
                        tokio::select! {
                            _ = ctx.cancellation_token.cancelled() => {
                                info!("Stopping background job {}", job.id());
                                break;
                            }
                            _ = ticker.tick() => {}
                        }

                        let blocking_job = job.clone();
                        let blocking_ctx = ctx.clone();
                        let result =
                            tokio::task::spawn_blocking(move || blocking_job.execute(&blocking_ctx))
                                .await;

                        match result {
                            Ok(Ok(())) => debug!("Background job {} completed", job.id()),
                            Ok(Err(JobError::Cancelled)) => {
                                info!("Background job {} cancelled", job.id());
                                break;
                            }
                            Ok(Err(e)) => error!("Background job {} failed: {}", job.id(), e),
                            Err(e) => error!("Background job {} panicked: {}", job.id(), e),
                        }
                    }
                })
            })
            .collect()
    }
}
