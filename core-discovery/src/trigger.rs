//! # Trigger Loop
//!
//! Decides when sweeps run.
//!
//! ## Triggers
//!
//! - One sweep at start
//! - A [`DiscoveryTrigger`] notification, fired after requests are enqueued
//! - The fallback timer, re-armed after every sweep
//!
//! A keepalive timer pings the storage pool in between. Sweeps run one after
//! another; notifications that arrive during a sweep collapse into a single
//! follow-up sweep. The loop exits when its [`CancellationToken`] is
//! cancelled, after any sweep in progress has finished.

use crate::worker::{DiscoveryWorker, SweepOutcome};
use core_library::db;
use core_metadata::MetadataProvider;
use core_runtime::DiscoverySettings;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Change notification handle. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryTrigger {
    notify: Arc<Notify>,
}

impl DiscoveryTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a sweep. Notifications sent while no one is waiting are kept
    /// as a single pending wakeup.
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepCause {
    Startup,
    Notification,
    Fallback,
}

impl fmt::Display for SweepCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepCause::Startup => write!(f, "startup"),
            SweepCause::Notification => write!(f, "notification"),
            SweepCause::Fallback => write!(f, "fallback"),
        }
    }
}

pub struct TriggerLoop<P> {
    worker: Arc<DiscoveryWorker<P>>,
    trigger: DiscoveryTrigger,
    fallback_interval: Duration,
    keepalive_interval: Duration,
}

impl<P: MetadataProvider> TriggerLoop<P> {
    pub fn new(
        worker: Arc<DiscoveryWorker<P>>,
        trigger: DiscoveryTrigger,
        settings: &DiscoverySettings,
    ) -> Self {
        Self {
            worker,
            trigger,
            fallback_interval: settings.fallback_interval(),
            keepalive_interval: settings.keepalive_interval(),
        }
    }

    pub fn with_intervals(mut self, fallback: Duration, keepalive: Duration) -> Self {
        self.fallback_interval = fallback;
        self.keepalive_interval = keepalive;
        self
    }

    /// Drive sweeps until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            fallback_secs = self.fallback_interval.as_secs(),
            keepalive_secs = self.keepalive_interval.as_secs(),
            "Discovery trigger loop started"
        );

        self.sweep(SweepCause::Startup).await;

        let fallback = time::sleep(self.fallback_interval);
        tokio::pin!(fallback);

        let mut keepalive = time::interval_at(
            Instant::now() + self.keepalive_interval,
            self.keepalive_interval,
        );
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                _ = self.trigger.notified() => {
                    self.sweep(SweepCause::Notification).await;
                    fallback.as_mut().reset(Instant::now() + self.fallback_interval);
                }
                () = &mut fallback => {
                    self.sweep(SweepCause::Fallback).await;
                    fallback.as_mut().reset(Instant::now() + self.fallback_interval);
                }
                _ = keepalive.tick() => self.keepalive().await,
            }
        }

        info!("Discovery trigger loop stopped");
    }

    async fn sweep(&self, cause: SweepCause) {
        match self.worker.run().await {
            Ok(SweepOutcome::Completed(report)) => {
                info!(%cause, requests = report.requests_consumed, "Triggered sweep completed")
            }
            Ok(outcome) => debug!(%cause, ?outcome, "Triggered sweep finished"),
            Err(e) => error!(%cause, error = %e, "Triggered sweep failed"),
        }
    }

    async fn keepalive(&self) {
        if let Err(e) = db::health_check(self.worker.pool()).await {
            warn!(error = %e, "Storage keepalive failed");
        }
    }
}
