//! Alert lifecycle management
//!
//! Raises alerts from classified detections, folds repeated detections of the
//! same incident into the open alert, and drives the forward-only state
//! machine active -> investigating -> resolved.

use chrono::Duration;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{Alert, AlertFilter, AlertId, AlertOutcome, AlertStatus, IncidentKey};
use crate::error::{MonitorError, MonitorResult};
use crate::models::Detection;
use crate::tracks::TrackAggregator;

/// Thread-safe alert store with per-incident deduplication
pub struct AlertManager {
    dedup_window: Duration,
    tracks: Arc<TrackAggregator>,
    next_id: AtomicU64,
    alerts: RwLock<BTreeMap<AlertId, Alert>>,
    /// One lock per (track, sensor, type) around the create-or-update decision
    incident_locks: Mutex<HashMap<IncidentKey, Arc<Mutex<()>>>>,
}

impl AlertManager {
    /// Alerts are only raised for sensors `tracks` knows to be assigned.
    pub fn new(dedup_window: Duration, tracks: Arc<TrackAggregator>) -> Self {
        Self {
            dedup_window,
            tracks,
            next_id: AtomicU64::new(1),
            alerts: RwLock::new(BTreeMap::new()),
            incident_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dedup_window(&self) -> Duration {
        self.dedup_window
    }

    fn read(&self) -> MonitorResult<RwLockReadGuard<'_, BTreeMap<AlertId, Alert>>> {
        self.alerts
            .read()
            .map_err(|_| MonitorError::StatePoisoned("alert store"))
    }

    fn write(&self) -> MonitorResult<RwLockWriteGuard<'_, BTreeMap<AlertId, Alert>>> {
        self.alerts
            .write()
            .map_err(|_| MonitorError::StatePoisoned("alert store"))
    }

    fn incident_lock(&self, key: &IncidentKey) -> MonitorResult<Arc<Mutex<()>>> {
        let mut locks = self
            .incident_locks
            .lock()
            .map_err(|_| MonitorError::StatePoisoned("incident locks"))?;
        Ok(Arc::clone(locks.entry(key.clone()).or_default()))
    }

    /// Whether `detection` lies within the dedup window of the span of
    /// detections already folded into `alert`.
    fn within_window(&self, alert: &Alert, detection: &Detection) -> bool {
        detection.timestamp >= alert.created_at - self.dedup_window
            && detection.timestamp <= alert.timestamp + self.dedup_window
    }

    /// Run `f` inside the mutual-exclusion scope of one incident.
    ///
    /// Every create-or-update decision and every resolution for the same
    /// (track, sensor, type) is serialized through this scope.
    pub fn with_incident<T>(
        &self,
        key: &IncidentKey,
        f: impl FnOnce() -> MonitorResult<T>,
    ) -> MonitorResult<T> {
        let lock = self.incident_lock(key)?;
        let _guard = lock
            .lock()
            .map_err(|_| MonitorError::StatePoisoned("incident lock"))?;
        f()
    }

    /// Create a new alert for the detection or fold it into the open one.
    ///
    /// The track must exist and own the detecting sensor. Folding keeps the
    /// higher confidence and widens the alert's time span; the lifecycle
    /// status of the open alert is unchanged.
    pub fn on_detection(&self, track_id: &str, detection: &Detection) -> MonitorResult<AlertOutcome> {
        let key = IncidentKey::new(track_id, detection);
        self.with_incident(&key, || self.create_or_update(&key, detection))
    }

    /// Create-or-update body of [`Self::on_detection`]. Callers must hold the
    /// incident scope of `key`.
    pub(crate) fn create_or_update(
        &self,
        key: &IncidentKey,
        detection: &Detection,
    ) -> MonitorResult<AlertOutcome> {
        self.tracks.ensure_assigned(&key.track_id, &key.sensor_id)?;

        // Lookup and fold under one write guard; a resolved alert is never folded into
        let mut alerts = self.write()?;
        let open = alerts
            .values_mut()
            .rev()
            .filter(|a| a.status.is_open() && a.matches_incident(key))
            .find(|a| self.within_window(a, detection));

        if let Some(alert) = open {
            alert.confidence = alert.confidence.max(detection.confidence);
            if detection.timestamp > alert.timestamp {
                alert.timestamp = detection.timestamp;
            }
            if detection.timestamp < alert.created_at {
                alert.created_at = detection.timestamp;
            }

            tracing::debug!(
                "[ALERTS] Folded detection into {} ({}), confidence now {}",
                alert.id,
                key,
                alert.confidence
            );
            return Ok(AlertOutcome::Updated(alert.id));
        }

        let id = AlertId(self.next_id.fetch_add(1, Ordering::SeqCst));
        alerts.insert(id, Alert::new(id, key.track_id.clone(), detection));

        tracing::info!(
            "[ALERTS] Raised {}: {} on track {} via {} (confidence {})",
            id,
            detection.detection_type,
            key.track_id,
            detection.sensor_id,
            detection.confidence
        );
        Ok(AlertOutcome::Created(id))
    }

    fn transition(&self, id: AlertId, to: AlertStatus) -> MonitorResult<Alert> {
        let mut alerts = self.write()?;
        let alert = alerts.get_mut(&id).ok_or(MonitorError::UnknownAlert(id))?;

        match (alert.status, to) {
            (AlertStatus::Resolved, _) => Err(MonitorError::AlreadyResolved(id)),
            (AlertStatus::Active, AlertStatus::Investigating)
            | (AlertStatus::Active, AlertStatus::Resolved)
            | (AlertStatus::Investigating, AlertStatus::Resolved) => {
                tracing::info!("[ALERTS] {} {} -> {}", id, alert.status, to);
                alert.status = to;
                Ok(alert.clone())
            }
            (from, to) => Err(MonitorError::InvalidTransition { id, from, to }),
        }
    }

    /// Operator acknowledgment: active -> investigating.
    pub fn acknowledge(&self, id: AlertId) -> MonitorResult<Alert> {
        self.transition(id, AlertStatus::Investigating)
    }

    /// Close an active or investigating alert. Resolved is terminal.
    pub fn resolve(&self, id: AlertId) -> MonitorResult<Alert> {
        self.transition(id, AlertStatus::Resolved)
    }

    pub fn get(&self, id: AlertId) -> MonitorResult<Alert> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(MonitorError::UnknownAlert(id))
    }

    /// Whether any active or investigating alert exists for `key`.
    pub fn has_open_incident(&self, key: &IncidentKey) -> MonitorResult<bool> {
        Ok(self
            .read()?
            .values()
            .any(|a| a.status.is_open() && a.matches_incident(key)))
    }

    /// Alerts matching `filter`, newest first.
    pub fn list(&self, filter: &AlertFilter) -> MonitorResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .read()?
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }
}
