//! # Escalation Scheduler
//!
//! Periodic driver for [`EscalationEngine::sweep`].
//!
//! Ticks use `MissedTickBehavior::Skip`: a sweep that overruns the interval swallows the
//! ticks it covered instead of queueing them. The sweep itself runs outside the
//! `select!`, so a stop request waits for an in-flight sweep to finish. The `select!`
//! is biased toward shutdown: once stop has been requested no further sweep starts,
//! even when a tick is already due.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::error::{EscalationError, Result};

use super::escalation_engine::{EscalationEngine, SweepReport};

/// A spawned tick loop and its own shutdown signal
struct RunningLoop {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

pub struct EscalationScheduler {
    engine: Arc<EscalationEngine>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    running: Mutex<Option<RunningLoop>>,
    last_report: Arc<parking_lot::RwLock<Option<SweepReport>>>,
    sweeps_completed: Arc<AtomicU64>,
}

impl std::fmt::Debug for EscalationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationScheduler")
            .field("interval", &self.interval)
            .field(
                "sweeps_completed",
                &self.sweeps_completed.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl EscalationScheduler {
    /// Driver ticking at the engine's configured sweep interval
    pub fn new(engine: Arc<EscalationEngine>, clock: Arc<dyn Clock>) -> Self {
        let interval = engine.config().sweep_interval();
        Self {
            engine,
            clock,
            interval,
            running: Mutex::new(None),
            last_report: Arc::new(parking_lot::RwLock::new(None)),
            sweeps_completed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the tick loop. The first sweep runs immediately.
    #[instrument(skip(self), fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Err(EscalationError::InvalidState(
                "Escalation scheduler is already running".to_string(),
            ));
        }

        let engine = self.engine.clone();
        let clock = self.clock.clone();
        let shutdown = Arc::new(Notify::new());
        let loop_shutdown = shutdown.clone();
        let last_report = self.last_report.clone();
        let sweeps_completed = self.sweeps_completed.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = loop_shutdown.notified() => {
                        debug!("Escalation scheduler received shutdown");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let report = engine.sweep(clock.now()).await;
                *last_report.write() = Some(report);
                sweeps_completed.fetch_add(1, Ordering::Relaxed);
            }
        });
        *running = Some(RunningLoop { handle, shutdown });

        info!("🚀 SCHEDULER: Escalation scheduler started");
        Ok(())
    }

    /// Stop the loop, waiting for an in-flight sweep to complete
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        let Some(current) = running.as_mut() else {
            debug!("SCHEDULER: Already stopped");
            return Ok(());
        };

        // notify_one keeps a permit if the loop is mid-sweep
        current.shutdown.notify_one();
        // Cleared only after the loop exits; a dropped stop() keeps the handle
        let joined = (&mut current.handle).await;
        *running = None;
        joined.map_err(|e| {
            EscalationError::InvalidState(format!("Escalation scheduler task failed: {e}"))
        })?;

        info!(
            sweeps_completed = self.sweeps_completed(),
            "🛑 SCHEDULER: Escalation scheduler stopped"
        );
        Ok(())
    }

    /// Run one sweep now, outside the tick loop
    pub async fn run_once(&self) -> SweepReport {
        let report = self.engine.sweep(self.clock.now()).await;
        *self.last_report.write() = Some(report.clone());
        self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
        report
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    pub fn last_report(&self) -> Option<SweepReport> {
        self.last_report.read().clone()
    }

    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed.load(Ordering::Relaxed)
    }
}
