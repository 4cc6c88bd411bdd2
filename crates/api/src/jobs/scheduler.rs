//! Periodic background jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// A task run on a fixed period.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    fn period(&self) -> Duration;

    async fn execute(&self) -> anyhow::Result<()>;
}

/// Runs registered jobs until shutdown is signalled.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            tasks: JoinSet::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawns one loop per job. The first run happens one period after start.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            self.tasks.spawn(async move {
                let name = job.name();
                let mut interval = tokio::time::interval(job.period());
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => run_once(job.as_ref()).await,
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                debug!(job = name, "Job stopping");
                                break;
                            }
                        }
                    }
                }
            });
        }
    }

    /// Signals every job loop to stop and waits up to `timeout` for them.
    pub async fn shutdown(mut self, timeout: Duration) {
        let _ = self.shutdown_tx.send(true);

        let drain = async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(()) => info!("Job scheduler stopped"),
            Err(_) => warn!(timeout_secs = timeout.as_secs(), "Job shutdown timed out"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes one run and records its outcome.
pub async fn run_once(job: &dyn Job) {
    let name = job.name();
    let start = Instant::now();
    let outcome = match job.execute().await {
        Ok(()) => {
            debug!(job = name, elapsed_ms = start.elapsed().as_millis() as u64, "Job completed");
            "success"
        }
        Err(e) => {
            warn!(job = name, error = %e, "Job failed");
            "failure"
        }
    };

    counter!("background_job_runs_total", "job" => name, "outcome" => outcome).increment(1);
    histogram!("background_job_duration_seconds", "job" => name)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn period(&self) -> Duration {
            Duration::from_millis(20)
        }

        async fn execute(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("simulated failure");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_once_survives_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = CountingJob {
            runs: runs.clone(),
            fail: true,
        };
        run_once(&job).await;
        run_once(&job).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_scheduler_runs_and_stops() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(CountingJob {
            runs: runs.clone(),
            fail: false,
        });
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(110)).await;
        scheduler.shutdown(Duration::from_secs(2)).await;

        let after_stop = runs.load(Ordering::SeqCst);
        assert!(after_stop >= 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_shutdown_without_jobs() {
        let mut scheduler = JobScheduler::default();
        scheduler.start();
        scheduler.shutdown(Duration::from_millis(100)).await;
    }
}
