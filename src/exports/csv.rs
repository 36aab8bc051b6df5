//! CSV export functionality
//!
//! Export alert history for offline review

use anyhow::Result;
use csv::Writer;

use crate::alerts::Alert;

/// Export alerts to CSV, one row per alert in the given order
pub fn export_alerts_csv(alerts: &[Alert]) -> Result<String> {
    let mut writer = Writer::from_writer(vec![]);

    writer.write_record([
        "Alert ID",
        "Timestamp",
        "First Seen",
        "Type",
        "Track",
        "Sensor",
        "Confidence (%)",
        "Status",
    ])?;

    for alert in alerts {
        writer.write_record([
            alert.id.to_string().as_str(),
            &alert.timestamp.to_rfc3339(),
            &alert.created_at.to_rfc3339(),
            alert.detection_type.as_str(),
            &alert.track_id,
            &alert.sensor_id,
            &alert.confidence.to_string(),
            alert.status.as_str(),
        ])?;
    }

    let csv_data = String::from_utf8(writer.into_inner()?)?;
    Ok(csv_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertId, AlertStatus};
    use crate::models::{Detection, DetectionType};
    use chrono::{TimeZone, Utc};

    #[test]
    fn alerts_csv_has_header_and_rows() {
        let detection = Detection {
            sensor_id: "S002".to_string(),
            detection_type: DetectionType::Animal,
            confidence: 87,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 23, 45).unwrap(),
        };
        let mut alert = Alert::new(AlertId(2), "T002", &detection);
        alert.status = AlertStatus::Investigating;

        let csv = export_alerts_csv(&[alert]).expect("csv export should succeed");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Alert ID,Timestamp"));
        assert!(lines[1].starts_with("A002,2024-05-01T14:23:45+00:00"));
        assert!(lines[1].ends_with("animal,T002,S002,87,investigating"));
    }

    #[test]
    fn empty_alert_list_is_header_only() {
        let csv = export_alerts_csv(&[]).expect("csv export should succeed");
        assert_eq!(csv.lines().count(), 1);
    }
}
