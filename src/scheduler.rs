use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::utils::error::AppError;
use crate::watcher::{CycleSummary, OrderWatcher};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleStats {
    pub completed_cycles: u64,
    /// Timer ticks dropped because a cycle was still running or polling was disabled.
    pub skipped_cycles: u64,
    pub orders_delivered: u64,
    pub failed_deliveries: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_summary: Option<CycleSummary>,
}

impl CycleStats {
    fn record(&mut self, summary: &CycleSummary) {
        self.completed_cycles += 1;
        self.orders_delivered += summary.delivered as u64;
        self.failed_deliveries += summary.failed_deliveries as u64;
        self.last_cycle_at = Some(summary.started_at);
        self.last_summary = Some(summary.clone());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub running: bool,
    pub interval_secs: u64,
    pub uptime_seconds: u64,
    pub stats: CycleStats,
}

/// Drives `OrderWatcher` cycles on a fixed interval.
///
/// At most one cycle runs at a time. A timer tick that finds a cycle in flight
/// is skipped; a manual trigger gets `AppError::CycleInProgress`.
pub struct CycleScheduler {
    scheduler: JobScheduler,
    watcher: Arc<Mutex<OrderWatcher>>,
    enabled: Arc<AtomicBool>,
    stats: Arc<RwLock<CycleStats>>,
    interval: Duration,
    job_id: Option<Uuid>,
    start_time: DateTime<Utc>,
}

impl CycleScheduler {
    pub async fn new(watcher: OrderWatcher, config: &SchedulerConfig) -> crate::Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            watcher: Arc::new(Mutex::new(watcher)),
            enabled: Arc::new(AtomicBool::new(config.enabled)),
            stats: Arc::new(RwLock::new(CycleStats::default())),
            interval: Duration::from_secs(config.interval_secs),
            job_id: None,
            start_time: Utc::now(),
        })
    }

    pub async fn start(&mut self) -> crate::Result<()> {
        let watcher = Arc::clone(&self.watcher);
        let enabled = Arc::clone(&self.enabled);
        let stats = Arc::clone(&self.stats);

        let job = Job::new_repeated_async(self.interval, move |_uuid, _l| {
            let watcher = Arc::clone(&watcher);
            let enabled = Arc::clone(&enabled);
            let stats = Arc::clone(&stats);

            Box::pin(async move {
                Self::execute_tick(watcher, enabled, stats).await;
            })
        })?;

        self.job_id = Some(self.scheduler.add(job).await?);
        self.scheduler.start().await?;
        tracing::info!("Cycle scheduler started, interval {:?}", self.interval);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> crate::Result<()> {
        if let Some(job_id) = self.job_id.take() {
            self.scheduler.remove(&job_id).await?;
        }
        self.scheduler.shutdown().await?;
        tracing::info!("Cycle scheduler shutdown");
        Ok(())
    }

    async fn execute_tick(
        watcher: Arc<Mutex<OrderWatcher>>,
        enabled: Arc<AtomicBool>,
        stats: Arc<RwLock<CycleStats>>,
    ) {
        if !enabled.load(Ordering::SeqCst) {
            tracing::debug!("Polling disabled, skipping tick");
            stats.write().await.skipped_cycles += 1;
            return;
        }

        let Ok(mut watcher) = watcher.try_lock() else {
            tracing::warn!("Previous cycle still running, skipping tick");
            stats.write().await.skipped_cycles += 1;
            return;
        };

        let summary = watcher.run_cycle().await;
        drop(watcher);
        stats.write().await.record(&summary);
    }

    /// Runs a cycle right away, regardless of the enabled flag.
    pub async fn trigger_now(&self) -> crate::Result<CycleSummary> {
        let mut watcher = self
            .watcher
            .try_lock()
            .map_err(|_| AppError::CycleInProgress)?;

        tracing::info!("Manual cycle triggered");
        let summary = watcher.run_cycle().await;
        drop(watcher);

        self.stats.write().await.record(&summary);
        Ok(summary)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!("Polling {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Flips polling on or off and returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        tracing::info!("Polling {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let uptime = Utc::now().signed_duration_since(self.start_time);

        SchedulerStatus {
            enabled: self.is_enabled(),
            running: self.watcher.try_lock().is_err(),
            interval_secs: self.interval.as_secs(),
            uptime_seconds: uptime.num_seconds().max(0) as u64,
            stats: self.stats.read().await.clone(),
        }
    }

    pub fn watcher(&self) -> Arc<Mutex<OrderWatcher>> {
        Arc::clone(&self.watcher)
    }
}
