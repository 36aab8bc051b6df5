//! Background heartbeat sweeper
//!
//! Periodically expires sensors that missed their heartbeat deadline.
//! Uses callbacks for event notification (UI-agnostic)

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::events::{MonitorEvent, SweeperStatus};
use crate::config::{MAX_SWEEP_INTERVAL, MIN_SWEEP_INTERVAL};
use crate::engine::RailMonitor;
use crate::models::SensorStatus;

/// Event callback type
pub type EventCallback = Arc<dyn Fn(MonitorEvent) + Send + Sync>;

/// Process-wide heartbeat sweeper with explicit start/stop
pub struct HeartbeatSweeper {
    monitor: RailMonitor,
    is_running: Arc<AtomicBool>,
    /// Bumped on every fresh start so a stopped loop never resumes
    generation: Arc<AtomicU64>,
    interval_seconds: Arc<Mutex<u64>>,
    sweep_count: Arc<AtomicU32>,
    sensors_expired: Arc<AtomicUsize>,
    last_sweep_time: Arc<Mutex<Option<String>>>,
}

impl HeartbeatSweeper {
    pub fn new(monitor: RailMonitor) -> Self {
        let interval = monitor.settings().sweep_interval_secs;
        Self {
            monitor,
            is_running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            interval_seconds: Arc::new(Mutex::new(interval)),
            sweep_count: Arc::new(AtomicU32::new(0)),
            sensors_expired: Arc::new(AtomicUsize::new(0)),
            last_sweep_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Start sweeping with an event callback.
    ///
    /// Starting while already running only updates the interval.
    pub async fn start<F>(&self, callback: F, interval: Option<u64>) -> Result<()>
    where
        F: Fn(MonitorEvent) + Send + Sync + 'static,
    {
        let interval_secs = interval
            .unwrap_or(self.monitor.settings().sweep_interval_secs)
            .clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);

        if self.is_running.load(Ordering::SeqCst) {
            *self.interval_seconds.lock().await = interval_secs;
            return Ok(());
        }

        *self.interval_seconds.lock().await = interval_secs;
        self.is_running.store(true, Ordering::SeqCst);
        self.sweep_count.store(0, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let cb: EventCallback = Arc::new(callback);
        cb(MonitorEvent::MonitoringStarted {
            interval_seconds: interval_secs,
        });

        let monitor = self.monitor.clone();
        let is_running = Arc::clone(&self.is_running);
        let current_generation = Arc::clone(&self.generation);
        let interval_seconds = Arc::clone(&self.interval_seconds);
        let sweep_count = Arc::clone(&self.sweep_count);
        let sensors_expired = Arc::clone(&self.sensors_expired);
        let last_sweep_time = Arc::clone(&self.last_sweep_time);

        let still_current = move || {
            is_running.load(Ordering::SeqCst)
                && current_generation.load(Ordering::SeqCst) == generation
        };

        tokio::spawn(async move {
            tracing::info!(
                "[SWEEPER] Heartbeat sweeper started (interval: {}s)",
                interval_secs
            );

            while still_current() {
                let sweep_number = sweep_count.fetch_add(1, Ordering::SeqCst) + 1;
                let interval = *interval_seconds.lock().await;

                match sweep_once(&monitor, &*cb, sweep_number) {
                    Ok(expired) => {
                        sensors_expired.fetch_add(expired, Ordering::SeqCst);
                        *last_sweep_time.lock().await = Some(monitor.now().to_rfc3339());
                    }
                    Err(e) => {
                        tracing::warn!("[SWEEPER] Sweep #{} failed: {}", sweep_number, e);
                        cb(MonitorEvent::MonitoringError {
                            message: e.to_string(),
                        });
                    }
                }

                // Check every second so a stop is observed quickly
                for _ in 0..interval {
                    if !still_current() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }

            tracing::info!("[SWEEPER] Heartbeat sweeper stopped");
            cb(MonitorEvent::MonitoringStopped);
        });

        Ok(())
    }

    /// Stop sweeping. The background loop exits within one second.
    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
    }

    pub async fn status(&self) -> SweeperStatus {
        SweeperStatus {
            is_running: self.is_running.load(Ordering::SeqCst),
            interval_seconds: *self.interval_seconds.lock().await,
            sweep_count: self.sweep_count.load(Ordering::SeqCst),
            last_sweep_time: self.last_sweep_time.lock().await.clone(),
            sensors_expired: self.sensors_expired.load(Ordering::SeqCst),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }
}

/// Run a single sweep pass, emitting one event per expired sensor.
fn sweep_once<F>(monitor: &RailMonitor, callback: &F, sweep_number: u32) -> Result<usize>
where
    F: Fn(MonitorEvent) + ?Sized,
{
    let expired = monitor.expire_stale_sensors()?;
    for sensor in &expired {
        tracing::warn!(
            "[SWEEPER] Sensor {} missed heartbeat deadline (last seen {:?})",
            sensor.sensor_id,
            sensor.last_heartbeat
        );
        callback(MonitorEvent::SensorWentInactive {
            sensor_id: sensor.sensor_id.clone(),
            last_heartbeat: sensor.last_heartbeat,
        });
    }

    let active_sensors = monitor
        .sensors()
        .list(monitor.now())?
        .iter()
        .filter(|s| s.status == SensorStatus::Active)
        .count();

    callback(MonitorEvent::SweepCompleted {
        sweep_number,
        expired: expired.len(),
        active_sensors,
    });

    tracing::debug!(
        "[SWEEPER] Sweep #{} complete: {} expired, {} active",
        sweep_number,
        expired.len(),
        active_sensors
    );
    Ok(expired.len())
}
