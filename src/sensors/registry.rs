//! Sensor registry
//!
//! Tracks connectivity and health of every trackside sensor from heartbeat
//! and error signals, plus the detections each sensor still has open.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::MAX_SIGNAL_STRENGTH;
use crate::error::{MonitorError, MonitorResult};
use crate::models::{Detection, DetectionType, SensorSnapshot, SensorStatus};

#[derive(Debug, Clone)]
struct SensorRecord {
    id: String,
    location: String,
    status: SensorStatus,
    signal_strength: u8,
    last_heartbeat: Option<DateTime<Utc>>,
    /// Unresolved detections, latest timestamp per type
    unresolved: BTreeMap<DetectionType, DateTime<Utc>>,
}

impl SensorRecord {
    fn new(id: String, location: String) -> Self {
        Self {
            id,
            location,
            status: SensorStatus::Inactive,
            signal_strength: 0,
            last_heartbeat: None,
            unresolved: BTreeMap::new(),
        }
    }

    /// Status as seen at `now`: an active sensor with a stale heartbeat reads inactive.
    fn status_at(&self, now: DateTime<Utc>, timeout: Duration) -> SensorStatus {
        match self.status {
            SensorStatus::Active if self.is_stale(now, timeout) => SensorStatus::Inactive,
            status => status,
        }
    }

    fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match self.last_heartbeat {
            Some(seen) => now.signed_duration_since(seen) > timeout,
            None => true,
        }
    }

    fn current_detection(&self) -> Option<DetectionType> {
        self.unresolved.keys().max().copied()
    }

    fn snapshot(&self, now: DateTime<Utc>, timeout: Duration) -> SensorSnapshot {
        SensorSnapshot {
            id: self.id.clone(),
            location: self.location.clone(),
            status: self.status_at(now, timeout),
            signal_strength: self.signal_strength,
            last_heartbeat: self.last_heartbeat,
            detection_type: self.current_detection(),
        }
    }
}

/// A sensor moved from active to inactive by [`SensorRegistry::expire_stale`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredSensor {
    pub sensor_id: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Thread-safe registry of sensors keyed by id
pub struct SensorRegistry {
    heartbeat_timeout: Duration,
    sensors: RwLock<BTreeMap<String, SensorRecord>>,
}

impl SensorRegistry {
    pub fn new(heartbeat_timeout: Duration) -> Self {
        Self {
            heartbeat_timeout,
            sensors: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_timeout
    }

    fn read(&self) -> MonitorResult<RwLockReadGuard<'_, BTreeMap<String, SensorRecord>>> {
        self.sensors
            .read()
            .map_err(|_| MonitorError::StatePoisoned("sensor registry"))
    }

    fn write(&self) -> MonitorResult<RwLockWriteGuard<'_, BTreeMap<String, SensorRecord>>> {
        self.sensors
            .write()
            .map_err(|_| MonitorError::StatePoisoned("sensor registry"))
    }

    /// Register a new sensor. It starts inactive until its first heartbeat.
    pub fn register_sensor(
        &self,
        id: impl Into<String>,
        location: impl Into<String>,
    ) -> MonitorResult<()> {
        let id = id.into();
        let mut sensors = self.write()?;
        if sensors.contains_key(&id) {
            return Err(MonitorError::DuplicateSensor(id));
        }

        tracing::debug!("[REGISTRY] Registered sensor {}", id);
        sensors.insert(id.clone(), SensorRecord::new(id, location.into()));
        Ok(())
    }

    /// Record a heartbeat: marks the sensor active and clears any error state.
    ///
    /// Strength above [`MAX_SIGNAL_STRENGTH`] is clamped. A heartbeat older
    /// than the last one seen changes neither the timestamp nor the strength.
    pub fn record_heartbeat(
        &self,
        id: &str,
        signal_strength: u8,
        timestamp: DateTime<Utc>,
    ) -> MonitorResult<()> {
        let mut sensors = self.write()?;
        let sensor = sensors
            .get_mut(id)
            .ok_or_else(|| MonitorError::UnknownSensor(id.to_string()))?;

        if sensor.status == SensorStatus::Error {
            tracing::info!("[REGISTRY] Sensor {} recovered from error", id);
        }

        sensor.status = SensorStatus::Active;
        if sensor.last_heartbeat.is_none_or(|seen| timestamp > seen) {
            sensor.last_heartbeat = Some(timestamp);
            sensor.signal_strength = signal_strength.min(MAX_SIGNAL_STRENGTH);
        }
        Ok(())
    }

    /// Force a sensor into error until a subsequent heartbeat clears it.
    pub fn record_error(&self, id: &str) -> MonitorResult<()> {
        let mut sensors = self.write()?;
        let sensor = sensors
            .get_mut(id)
            .ok_or_else(|| MonitorError::UnknownSensor(id.to_string()))?;

        tracing::warn!("[REGISTRY] Sensor {} reported error", id);
        sensor.status = SensorStatus::Error;
        sensor.signal_strength = 0;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> MonitorResult<bool> {
        Ok(self.read()?.contains_key(id))
    }

    /// Connectivity status of a sensor as of `now`.
    pub fn status(&self, id: &str, now: DateTime<Utc>) -> MonitorResult<SensorStatus> {
        self.read()?
            .get(id)
            .map(|s| s.status_at(now, self.heartbeat_timeout))
            .ok_or_else(|| MonitorError::UnknownSensor(id.to_string()))
    }

    /// Fail unless the sensor exists and is active at `now`.
    pub fn ensure_available(&self, id: &str, now: DateTime<Utc>) -> MonitorResult<()> {
        match self.status(id, now)? {
            SensorStatus::Active => Ok(()),
            _ => Err(MonitorError::SensorUnavailable(id.to_string())),
        }
    }

    /// Store a detection as unresolved on its sensor, latest timestamp wins.
    pub fn record_detection(&self, detection: &Detection) -> MonitorResult<()> {
        let mut sensors = self.write()?;
        let sensor = sensors
            .get_mut(&detection.sensor_id)
            .ok_or_else(|| MonitorError::UnknownSensor(detection.sensor_id.clone()))?;

        sensor
            .unresolved
            .entry(detection.detection_type)
            .and_modify(|seen| {
                if detection.timestamp > *seen {
                    *seen = detection.timestamp;
                }
            })
            .or_insert(detection.timestamp);
        Ok(())
    }

    /// Drop the unresolved detection of `kind`. Returns whether one was open.
    pub fn clear_detection(&self, id: &str, kind: DetectionType) -> MonitorResult<bool> {
        let mut sensors = self.write()?;
        let sensor = sensors
            .get_mut(id)
            .ok_or_else(|| MonitorError::UnknownSensor(id.to_string()))?;
        Ok(sensor.unresolved.remove(&kind).is_some())
    }

    /// Unresolved detection types of a sensor, least severe first.
    pub fn unresolved_detections(&self, id: &str) -> MonitorResult<Vec<DetectionType>> {
        self.read()?
            .get(id)
            .map(|s| s.unresolved.keys().copied().collect())
            .ok_or_else(|| MonitorError::UnknownSensor(id.to_string()))
    }

    /// Persist active -> inactive for every sensor whose heartbeat went stale.
    ///
    /// Sensors in error are left alone.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> MonitorResult<Vec<ExpiredSensor>> {
        let mut sensors = self.write()?;
        let mut expired = Vec::new();

        for sensor in sensors.values_mut() {
            if sensor.status == SensorStatus::Active
                && sensor.is_stale(now, self.heartbeat_timeout)
            {
                sensor.status = SensorStatus::Inactive;
                expired.push(ExpiredSensor {
                    sensor_id: sensor.id.clone(),
                    last_heartbeat: sensor.last_heartbeat,
                });
            }
        }

        Ok(expired)
    }

    pub fn snapshot(&self, id: &str, now: DateTime<Utc>) -> MonitorResult<SensorSnapshot> {
        self.read()?
            .get(id)
            .map(|s| s.snapshot(now, self.heartbeat_timeout))
            .ok_or_else(|| MonitorError::UnknownSensor(id.to_string()))
    }

    /// Snapshot of every sensor, ordered by id.
    pub fn list(&self, now: DateTime<Utc>) -> MonitorResult<Vec<SensorSnapshot>> {
        Ok(self
            .read()?
            .values()
            .map(|s| s.snapshot(now, self.heartbeat_timeout))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap()
    }

    fn registry() -> SensorRegistry {
        let registry = SensorRegistry::new(Duration::seconds(30));
        registry.register_sensor("S001", "KM 12.3").unwrap();
        registry
    }

    #[test]
    fn new_sensor_is_inactive_until_heartbeat() {
        let registry = registry();
        assert_eq!(
            registry.status("S001", t0()).unwrap(),
            SensorStatus::Inactive
        );

        registry.record_heartbeat("S001", 5, t0()).unwrap();
        assert_eq!(registry.status("S001", t0()).unwrap(), SensorStatus::Active);
    }

    #[test]
    fn stale_heartbeat_reads_inactive_on_next_check() {
        let registry = registry();
        registry.record_heartbeat("S001", 4, t0()).unwrap();

        let within = t0() + Duration::seconds(30);
        let past = t0() + Duration::seconds(31);
        assert_eq!(registry.status("S001", within).unwrap(), SensorStatus::Active);
        assert_eq!(registry.status("S001", past).unwrap(), SensorStatus::Inactive);
    }

    #[test]
    fn error_overrides_until_fresh_heartbeat() {
        let registry = registry();
        registry.record_heartbeat("S001", 5, t0()).unwrap();
        registry.record_error("S001").unwrap();

        assert_eq!(registry.status("S001", t0()).unwrap(), SensorStatus::Error);
        let expired = registry
            .expire_stale(t0() + Duration::minutes(10))
            .unwrap();
        assert!(expired.is_empty(), "sweeper must not touch error sensors");
        assert_eq!(
            registry.status("S001", t0() + Duration::minutes(10)).unwrap(),
            SensorStatus::Error
        );

        let later = t0() + Duration::minutes(11);
        registry.record_heartbeat("S001", 3, later).unwrap();
        assert_eq!(registry.status("S001", later).unwrap(), SensorStatus::Active);
    }

    #[test]
    fn expire_stale_transitions_only_stale_active_sensors() {
        let registry = registry();
        registry.register_sensor("S002", "KM 12.8").unwrap();
        registry.record_heartbeat("S001", 5, t0()).unwrap();
        registry
            .record_heartbeat("S002", 5, t0() + Duration::seconds(50))
            .unwrap();

        let expired = registry.expire_stale(t0() + Duration::seconds(60)).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].sensor_id, "S001");
        assert_eq!(expired[0].last_heartbeat, Some(t0()));
    }

    #[test]
    fn signal_strength_is_clamped() {
        let registry = registry();
        registry.record_heartbeat("S001", 9, t0()).unwrap();
        assert_eq!(registry.snapshot("S001", t0()).unwrap().signal_strength, 5);
    }

    #[test]
    fn out_of_order_heartbeat_keeps_latest_strength() {
        let registry = registry();
        let later = t0() + Duration::seconds(10);
        registry.record_heartbeat("S001", 4, later).unwrap();
        registry.record_heartbeat("S001", 1, t0()).unwrap();

        let snapshot = registry.snapshot("S001", later).unwrap();
        assert_eq!(snapshot.signal_strength, 4);
        assert_eq!(snapshot.last_heartbeat, Some(later));
    }

    #[test]
    fn unknown_and_duplicate_ids_fail() {
        let registry = registry();
        assert_eq!(
            registry.record_heartbeat("S999", 1, t0()),
            Err(MonitorError::UnknownSensor("S999".to_string()))
        );
        assert_eq!(
            registry.register_sensor("S001", "KM 1.0"),
            Err(MonitorError::DuplicateSensor("S001".to_string()))
        );
    }

    #[test]
    fn current_detection_prefers_person() {
        let registry = registry();
        for kind in [DetectionType::Animal, DetectionType::Person] {
            registry
                .record_detection(&Detection {
                    sensor_id: "S001".to_string(),
                    detection_type: kind,
                    confidence: 80,
                    timestamp: t0(),
                })
                .unwrap();
        }

        let snapshot = registry.snapshot("S001", t0()).unwrap();
        assert_eq!(snapshot.detection_type, Some(DetectionType::Person));

        assert!(registry.clear_detection("S001", DetectionType::Person).unwrap());
        let snapshot = registry.snapshot("S001", t0()).unwrap();
        assert_eq!(snapshot.detection_type, Some(DetectionType::Animal));
    }
}
