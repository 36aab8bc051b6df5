//! Track status aggregation
//!
//! Owns the track -> sensor assignment and derives each track's safety status
//! from the unresolved detections of its sensors. Status is never stored.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{MonitorError, MonitorResult};
use crate::models::{Detection, SensorStatus, TrackSnapshot, TrackStatus};
use crate::sensors::SensorRegistry;

#[derive(Debug, Clone)]
struct TrackRecord {
    sensor_ids: Vec<String>,
    last_detection: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct TrackTable {
    tracks: BTreeMap<String, TrackRecord>,
    /// sensor id -> owning track id
    owners: HashMap<String, String>,
}

/// Derives track safety status from the sensor registry
pub struct TrackAggregator {
    sensors: Arc<SensorRegistry>,
    table: RwLock<TrackTable>,
}

impl TrackAggregator {
    pub fn new(sensors: Arc<SensorRegistry>) -> Self {
        Self {
            sensors,
            table: RwLock::new(TrackTable::default()),
        }
    }

    fn read(&self) -> MonitorResult<RwLockReadGuard<'_, TrackTable>> {
        self.table
            .read()
            .map_err(|_| MonitorError::StatePoisoned("track table"))
    }

    fn write(&self) -> MonitorResult<RwLockWriteGuard<'_, TrackTable>> {
        self.table
            .write()
            .map_err(|_| MonitorError::StatePoisoned("track table"))
    }

    pub fn register_track(&self, id: impl Into<String>) -> MonitorResult<()> {
        let id = id.into();
        let mut table = self.write()?;
        if table.tracks.contains_key(&id) {
            return Err(MonitorError::DuplicateTrack(id));
        }

        tracing::debug!("[TRACKS] Registered track {}", id);
        table.tracks.insert(
            id,
            TrackRecord {
                sensor_ids: Vec::new(),
                last_detection: None,
            },
        );
        Ok(())
    }

    /// Assign a registered sensor to a track, preserving assignment order.
    ///
    /// Assigning a sensor to the track it already belongs to is a no-op.
    pub fn assign_sensor(&self, track_id: &str, sensor_id: &str) -> MonitorResult<()> {
        if !self.sensors.contains(sensor_id)? {
            return Err(MonitorError::UnknownSensor(sensor_id.to_string()));
        }

        let mut table = self.write()?;
        if !table.tracks.contains_key(track_id) {
            return Err(MonitorError::UnknownTrack(track_id.to_string()));
        }

        match table.owners.get(sensor_id) {
            Some(owner) if owner == track_id => return Ok(()),
            Some(owner) => {
                return Err(MonitorError::SensorAlreadyAssigned {
                    sensor_id: sensor_id.to_string(),
                    track_id: owner.clone(),
                });
            }
            None => {}
        }

        table
            .owners
            .insert(sensor_id.to_string(), track_id.to_string());
        if let Some(track) = table.tracks.get_mut(track_id) {
            track.sensor_ids.push(sensor_id.to_string());
        }

        tracing::debug!("[TRACKS] Assigned sensor {} to track {}", sensor_id, track_id);
        Ok(())
    }

    /// Track a sensor is assigned to.
    pub fn track_for_sensor(&self, sensor_id: &str) -> MonitorResult<String> {
        self.read()?
            .owners
            .get(sensor_id)
            .cloned()
            .ok_or_else(|| MonitorError::SensorNotAssigned {
                sensor_id: sensor_id.to_string(),
                track_id: None,
            })
    }

    /// Fail unless `track_id` exists and owns `sensor_id`.
    pub fn ensure_assigned(&self, track_id: &str, sensor_id: &str) -> MonitorResult<()> {
        let table = self.read()?;
        let track = table
            .tracks
            .get(track_id)
            .ok_or_else(|| MonitorError::UnknownTrack(track_id.to_string()))?;

        if track.sensor_ids.iter().any(|s| s == sensor_id) {
            Ok(())
        } else {
            Err(MonitorError::SensorNotAssigned {
                sensor_id: sensor_id.to_string(),
                track_id: Some(track_id.to_string()),
            })
        }
    }

    fn evaluate(&self, track: &TrackRecord) -> MonitorResult<TrackStatus> {
        let mut status = TrackStatus::Safe;
        for sensor_id in &track.sensor_ids {
            for kind in self.sensors.unresolved_detections(sensor_id)? {
                status = status.max(kind.track_status());
            }
        }
        Ok(status)
    }

    /// Recompute a track's status from its sensors' unresolved detections.
    ///
    /// Danger if any sensor holds a person detection, warning if any holds an
    /// animal detection, otherwise safe.
    pub fn current_status(&self, track_id: &str) -> MonitorResult<TrackStatus> {
        let table = self.read()?;
        let track = table
            .tracks
            .get(track_id)
            .ok_or_else(|| MonitorError::UnknownTrack(track_id.to_string()))?;
        self.evaluate(track)
    }

    /// Stamp the owning track's last detection time and re-evaluate it.
    ///
    /// Returns the owning track id and its status after the detection.
    pub fn on_detection(&self, detection: &Detection) -> MonitorResult<(String, TrackStatus)> {
        let mut table = self.write()?;
        let track_id = table
            .owners
            .get(&detection.sensor_id)
            .cloned()
            .ok_or_else(|| MonitorError::SensorNotAssigned {
                sensor_id: detection.sensor_id.clone(),
                track_id: None,
            })?;
        let track = table
            .tracks
            .get_mut(&track_id)
            .ok_or_else(|| MonitorError::UnknownTrack(track_id.clone()))?;

        if track
            .last_detection
            .is_none_or(|seen| detection.timestamp > seen)
        {
            track.last_detection = Some(detection.timestamp);
        }

        let status = self.evaluate(track)?;
        tracing::debug!(
            "[TRACKS] Track {} is {} after {} detection on {}",
            track_id,
            status,
            detection.detection_type,
            detection.sensor_id
        );
        Ok((track_id, status))
    }

    fn snapshot_of(
        &self,
        track_id: &str,
        track: &TrackRecord,
        now: DateTime<Utc>,
    ) -> MonitorResult<TrackSnapshot> {
        let mut active_sensors = 0;
        for sensor_id in &track.sensor_ids {
            if self.sensors.status(sensor_id, now)? == SensorStatus::Active {
                active_sensors += 1;
            }
        }

        Ok(TrackSnapshot {
            track_id: track_id.to_string(),
            status: self.evaluate(track)?,
            sensor_ids: track.sensor_ids.clone(),
            sensor_count: track.sensor_ids.len(),
            active_sensors,
            last_detection: track.last_detection,
        })
    }

    pub fn snapshot(&self, track_id: &str, now: DateTime<Utc>) -> MonitorResult<TrackSnapshot> {
        let table = self.read()?;
        let track = table
            .tracks
            .get(track_id)
            .ok_or_else(|| MonitorError::UnknownTrack(track_id.to_string()))?;
        self.snapshot_of(track_id, track, now)
    }

    /// Snapshot of every track, ordered by id.
    pub fn list(&self, now: DateTime<Utc>) -> MonitorResult<Vec<TrackSnapshot>> {
        let table = self.read()?;
        table
            .tracks
            .iter()
            .map(|(id, track)| self.snapshot_of(id, track, now))
            .collect()
    }
}
