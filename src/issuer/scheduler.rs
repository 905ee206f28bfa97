use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{error, info};

use super::service::Issuer;
use crate::dsl::unix_now;

/// Configuration for the periodic republication task
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether the scheduler is enabled
    pub enabled: bool,
    /// Time between publications
    pub interval: Duration,
    /// Wait for the next epoch boundary before the first tick
    pub align_to_epoch: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            align_to_epoch: true,
        }
    }
}

/// Republishes the status list on a fixed period.
///
/// The task only goes through [`Issuer::publish`], so it serializes with
/// explicit track and revoke calls the same way they serialize with each
/// other.
pub struct PublicationScheduler {
    issuer: Arc<Issuer>,
    config: SchedulerConfig,
}

/// Running scheduler; dropping it without [`SchedulerHandle::stop`] leaves
/// the task running until the runtime shuts down.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PublicationScheduler {
    pub fn new(issuer: Arc<Issuer>, config: SchedulerConfig) -> Self {
        Self { issuer, config }
    }

    /// Starts the scheduler in a background task
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = if self.config.enabled {
            info!(
                "Starting publication scheduler, every {:?}",
                self.config.interval
            );
            tokio::spawn(Self::run(self.issuer, self.config, shutdown_rx))
        } else {
            info!("Publication scheduler is disabled");
            tokio::spawn(async {})
        };

        SchedulerHandle { shutdown, task }
    }

    async fn run(issuer: Arc<Issuer>, config: SchedulerConfig, mut shutdown: watch::Receiver<bool>) {
        if config.align_to_epoch {
            let delay = until_next_epoch(&issuer, unix_now());
            info!("First publication in {:?}", delay);
            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.changed() => {
                    info!("Publication scheduler stopped");
                    return;
                }
            }
        }

        let mut ticker = interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => Self::perform_publication(&issuer).await,
                _ = shutdown.changed() => break,
            }
        }

        info!("Publication scheduler stopped");
    }

    async fn perform_publication(issuer: &Issuer) {
        match issuer.publish(unix_now()).await {
            Ok(publication) => info!(
                "Scheduled publication done, {} identifiers",
                publication.claims().sid.len()
            ),
            // Keep going, the next tick retries
            Err(e) => error!("Scheduled publication failed: {}", e),
        }
    }
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the task to finish
    pub async fn stop(self) {
        info!("Stopping publication scheduler");
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Publication scheduler task failed: {}", e);
        }
    }
}

fn until_next_epoch(issuer: &Issuer, now: u64) -> Duration {
    let period = issuer.period();
    let next = period.epoch_at(now).next_start(period);
    Duration::from_secs(next.saturating_sub(now))
}
