//! Background worker that drives Mark, Sweep and Notify on a schedule

use crate::config::LifecycleConfig;
use crate::controller::LifecycleController;
use crate::report::{CycleReport, Phase};
use reclaim_notify::Notifier;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// How often each phase runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Time between Mark runs
    pub mark: Duration,
    /// Time between Sweep runs
    pub sweep: Duration,
    /// Time between Notify runs
    pub notify: Duration,
}

impl Schedule {
    /// Take the intervals from an account configuration
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self {
            mark: config.mark_interval(),
            sweep: config.sweep_interval(),
            notify: config.notify_interval(),
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            mark: Duration::from_secs(60 * 60),
            sweep: Duration::from_secs(24 * 60 * 60),
            notify: Duration::from_secs(12 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Phase(Phase),
    Notify,
}

/// Runs every registered controller on a [`Schedule`]
///
/// Controllers for different accounts run concurrently; each controller keeps
/// its own Mark and Sweep from overlapping.
///
/// # Examples
///
/// ```no_run
/// use reclaim_lifecycle::{LifecycleController, LifecycleWorker, Schedule};
/// use std::sync::Arc;
///
/// # async fn run(controller: LifecycleController) {
/// let mut worker = LifecycleWorker::new(Schedule::default());
/// worker.add_controller(Arc::new(controller));
///
/// // Runs until Ctrl+C
/// worker.run().await;
/// # }
/// ```
pub struct LifecycleWorker {
    controllers: Vec<Arc<LifecycleController>>,
    notifier: Option<Arc<Notifier>>,
    schedule: Schedule,
}

impl LifecycleWorker {
    /// Create a worker with no controllers
    pub fn new(schedule: Schedule) -> Self {
        Self {
            controllers: Vec::new(),
            notifier: None,
            schedule,
        }
    }

    /// Add a controller
    pub fn add_controller(&mut self, controller: Arc<LifecycleController>) -> &mut Self {
        self.controllers.push(controller);
        self
    }

    /// Notify owners on the notify interval
    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Get the schedule
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Registered controllers
    pub fn controllers(&self) -> &[Arc<LifecycleController>] {
        &self.controllers
    }

    async fn run_phase(&self, phase: Phase) -> Vec<CycleReport> {
        let handles: Vec<JoinHandle<CycleReport>> = self
            .controllers
            .iter()
            .map(|controller| {
                let controller = Arc::clone(controller);
                tokio::spawn(async move {
                    match phase {
                        Phase::Mark => controller.mark().await,
                        Phase::Sweep => controller.sweep().await,
                    }
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => {
                    if !report.is_clean() {
                        tracing::warn!(
                            pass_id = %report.pass_id,
                            "{} finished with {} failed kinds",
                            phase,
                            report.failed.len()
                        );
                    }
                    reports.push(report);
                }
                Err(e) => tracing::error!("{} task failed: {}", phase, e),
            }
        }
        reports
    }

    async fn run_notify(&self) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        match notifier.notify().await {
            Ok(report) => tracing::info!(
                "Notify completed: {} owners notified, {} messages sent, {} failures",
                report.owners_notified,
                report.messages_sent,
                report.failures
            ),
            Err(e) => tracing::error!("Notify failed: {}", e),
        }
    }

    async fn run_job(&self, job: Job) {
        match job {
            Job::Phase(phase) => {
                self.run_phase(phase).await;
            }
            Job::Notify => self.run_notify().await,
        }
    }

    fn cancel_all(&self) {
        for controller in &self.controllers {
            controller.cancellation_token().cancel();
        }
    }

    /// Run until a shutdown signal (Ctrl+C) is received
    ///
    /// See [`LifecycleWorker::run_until`].
    pub async fn run(&self) {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received, stopping lifecycle worker"),
                Err(e) => {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Run until `shutdown` completes
    ///
    /// Shutdown is observed while a phase is running as well as between
    /// phases. It cancels every controller's token, waits for in-flight
    /// passes to stop at their next page or owner boundary, and drops an
    /// in-flight Notify.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut mark = interval(self.schedule.mark);
        let mut sweep = interval(self.schedule.sweep);
        let mut notify = interval(self.schedule.notify);
        for ticker in [&mut mark, &mut sweep, &mut notify] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        tracing::info!(
            "Lifecycle worker started for {} controllers (mark: {:?}, sweep: {:?}, notify: {:?})",
            self.controllers.len(),
            self.schedule.mark,
            self.schedule.sweep,
            self.schedule.notify
        );

        tokio::pin!(shutdown);

        loop {
            let job = tokio::select! {
                _ = mark.tick() => Job::Phase(Phase::Mark),
                _ = sweep.tick() => Job::Phase(Phase::Sweep),
                _ = notify.tick() => Job::Notify,
                _ = &mut shutdown => {
                    self.cancel_all();
                    break;
                }
            };

            let work = self.run_job(job);
            tokio::pin!(work);
            let stopped = tokio::select! {
                _ = &mut work => false,
                _ = &mut shutdown => true,
            };

            if stopped {
                self.cancel_all();
                if let Job::Phase(phase) = job {
                    tracing::info!("Waiting for in-flight {} to stop", phase);
                    work.await;
                }
                break;
            }
        }

        for controller in &self.controllers {
            let metrics = controller.metrics().await;
            tracing::info!(
                account = %controller.account(),
                "Lifecycle worker stopped. Final metrics:\n{}",
                metrics.summary()
            );
        }
    }

    /// Run a fixed number of Mark, Sweep, Notify cycles (useful for testing)
    ///
    /// Cycles are spaced by the mark interval. Returns the sweep reports of
    /// the last cycle.
    pub async fn run_cycles(&self, cycles: usize) -> Vec<CycleReport> {
        let mut ticker = interval(self.schedule.mark);
        let mut last = Vec::new();

        tracing::info!(
            "Lifecycle worker started for {} cycles (interval: {:?})",
            cycles,
            self.schedule.mark
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting cycle {}/{}", cycle + 1, cycles);

            self.run_phase(Phase::Mark).await;
            last = self.run_phase(Phase::Sweep).await;
            self.run_notify().await;
        }

        last
    }
}
