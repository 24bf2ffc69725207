//! Background job runner.
//!
//! Each job gets its own task looping on a fixed interval until shutdown is
//! signalled over a watch channel. Shutdown never interrupts a run in
//! progress; the loop exits after the current run completes.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A periodic background job.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Pause between two consecutive runs.
    fn interval(&self) -> Duration;

    /// One run of the job.
    async fn run(&self) -> Result<(), String>;
}

/// Owns the job tasks and the shutdown signal.
pub struct JobScheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Spawns the job's loop. The first run happens one full interval after
    /// startup, not immediately.
    pub fn spawn<J: Job + 'static>(&mut self, job: J) {
        let job = Arc::new(job);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(job.interval());
            // interval() fires immediately on the first tick; swallow it.
            ticker.tick().await;

            info!(job = job.name(), interval = ?job.interval(), "job scheduled");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let started = std::time::Instant::now();
                        match job.run().await {
                            Ok(()) => debug!(
                                job = job.name(),
                                elapsed_ms = started.elapsed().as_millis(),
                                "job run finished"
                            ),
                            Err(e) => error!(
                                job = job.name(),
                                elapsed_ms = started.elapsed().as_millis(),
                                error = %e,
                                "job run failed"
                            ),
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!(job = job.name(), "job stopping");
                            break;
                        }
                    }
                }
            }
        });

        self.handles.push(handle);
    }

    /// Signals every job loop to stop after its current run.
    pub fn shutdown(&self) {
        info!("stopping background jobs");
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for the job loops to wind down, up to `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let drain = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("job task panicked: {}", e);
                }
            }
        };

        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("job shutdown timed out after {:?}", timeout);
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting_job"
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        async fn run(&self) -> Result<(), String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn spawned_job_runs_repeatedly() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.spawn(CountingJob { runs: runs.clone() });

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.spawn(CountingJob { runs: runs.clone() });

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        let after_shutdown = runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn failing_job_keeps_running() {
        struct FailingJob {
            runs: Arc<AtomicUsize>,
        }

        #[async_trait::async_trait]
        impl Job for FailingJob {
            fn name(&self) -> &'static str {
                "failing_job"
            }

            fn interval(&self) -> Duration {
                Duration::from_millis(10)
            }

            async fn run(&self) -> Result<(), String> {
                self.runs.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            }
        }

        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.spawn(FailingJob { runs: runs.clone() });

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        // Failures are logged, the loop keeps ticking.
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }
}
