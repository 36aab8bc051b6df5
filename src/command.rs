use crate::alerts::AlertStatus;
use crate::models::DetectionType;

/// Output format for list-style commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Snapshot,
    Summary,
    Alerts {
        status: Option<AlertStatus>,
        detection_type: Option<DetectionType>,
        format: ExportFormat,
    },
    Watch {
        interval: Option<u64>,
    },
    Help,
    Version,
}
