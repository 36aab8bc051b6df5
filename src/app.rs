use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::alerts::{Alert, AlertFilter};
use crate::cli::{usage_text, version_text};
use crate::command::{AppCommand, ExportFormat};
use crate::engine::RailMonitor;
use crate::exports::{MonitorSnapshot, export_alerts_csv, export_alerts_json};
use crate::models::DashboardSummary;
use crate::monitor::{HeartbeatSweeper, MonitorEvent, SweeperStatus};

pub type OutputHook = Arc<dyn Fn(&str) + Send + Sync>;
pub type EventHook = Arc<dyn Fn(&MonitorEvent) + Send + Sync>;

/// How often `watch` polls for cancellation
const WATCH_POLL: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct AppContext {
    monitor: RailMonitor,
    output_hook: OutputHook,
    event_hook: EventHook,
    cancel_flag: Arc<AtomicBool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum AppCommandResult {
    HelpText(String),
    VersionText(String),
    Snapshot(MonitorSnapshot),
    Summary(DashboardSummary),
    Alerts {
        alerts: Vec<Alert>,
        #[serde(skip)]
        format: ExportFormat,
    },
    Watch(SweeperStatus),
}

impl Default for AppContext {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AppContext {
    /// Context over an empty monitor configured from the environment.
    pub fn from_env() -> Self {
        Self::new(RailMonitor::from_env())
    }

    pub fn new(monitor: RailMonitor) -> Self {
        Self {
            monitor,
            output_hook: Arc::new(|line| println!("{}", line)),
            event_hook: Arc::new(|_| {}),
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_monitor(mut self, monitor: RailMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_output_hook(mut self, output_hook: OutputHook) -> Self {
        self.output_hook = output_hook;
        self
    }

    pub fn with_event_hook(mut self, event_hook: EventHook) -> Self {
        self.event_hook = event_hook;
        self
    }

    pub fn monitor(&self) -> &RailMonitor {
        &self.monitor
    }

    pub fn emit_line(&self, line: &str) {
        (self.output_hook)(line);
    }

    pub fn emit_event(&self, event: &MonitorEvent) {
        (self.event_hook)(event);
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn reset_cancel(&self) {
        self.cancel_flag.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Execute a pre-parsed command with an explicit execution context.
pub async fn execute_command_with_context(command: AppCommand, context: &AppContext) -> Result<()> {
    let result = execute_command_typed(command, context).await?;
    emit_command_result(&result, context)
}

/// Execute a pre-parsed command and return a strongly-typed result payload.
pub async fn execute_command_typed(
    command: AppCommand,
    context: &AppContext,
) -> Result<AppCommandResult> {
    let monitor = context.monitor();
    match command {
        AppCommand::Help => Ok(AppCommandResult::HelpText(usage_text())),
        AppCommand::Version => Ok(AppCommandResult::VersionText(version_text())),
        AppCommand::Snapshot => Ok(AppCommandResult::Snapshot(MonitorSnapshot::capture(
            monitor,
        )?)),
        AppCommand::Summary => Ok(AppCommandResult::Summary(
            monitor
                .dashboard_summary()
                .context("Failed to build dashboard summary")?,
        )),
        AppCommand::Alerts {
            status,
            detection_type,
            format,
        } => {
            let filter = AlertFilter {
                status,
                detection_type,
            };
            let alerts = monitor
                .list_alerts(&filter)
                .context("Failed to list alerts")?;
            Ok(AppCommandResult::Alerts { alerts, format })
        }
        AppCommand::Watch { interval } => Ok(AppCommandResult::Watch(
            watch(interval, context).await?,
        )),
    }
}

/// Run the heartbeat sweeper, streaming events as JSON lines until cancelled.
async fn watch(interval: Option<u64>, context: &AppContext) -> Result<SweeperStatus> {
    let sweeper = HeartbeatSweeper::new(context.monitor().clone());
    let sink = context.clone();

    sweeper
        .start(
            move |event| {
                sink.emit_event(&event);
                match serde_json::to_string(&event) {
                    Ok(line) => sink.emit_line(&line),
                    Err(e) => {
                        crate::log_warn!("[WATCH] Failed to serialize event: {}", e);
                    }
                }
            },
            interval,
        )
        .await
        .context("Failed to start heartbeat sweeper")?;

    while sweeper.is_running() && !context.is_cancelled() {
        tokio::time::sleep(WATCH_POLL).await;
    }
    sweeper.stop();

    Ok(sweeper.status().await)
}

fn emit_command_result(result: &AppCommandResult, context: &AppContext) -> Result<()> {
    match result {
        AppCommandResult::HelpText(text) | AppCommandResult::VersionText(text) => {
            context.emit_line(text);
            Ok(())
        }
        AppCommandResult::Snapshot(snapshot) => {
            let output = serde_json::to_string_pretty(snapshot)
                .context("Failed to serialize snapshot")?;
            context.emit_line(&output);
            Ok(())
        }
        AppCommandResult::Summary(summary) => {
            let output = serde_json::to_string_pretty(summary)
                .context("Failed to serialize dashboard summary")?;
            context.emit_line(&output);
            Ok(())
        }
        AppCommandResult::Alerts { alerts, format } => {
            let output = match format {
                ExportFormat::Json => export_alerts_json(alerts),
                ExportFormat::Csv => export_alerts_csv(alerts),
            }
            .context("Failed to export alerts")?;
            context.emit_line(output.trim_end());
            Ok(())
        }
        AppCommandResult::Watch(status) => {
            let output = serde_json::to_string_pretty(status)
                .context("Failed to serialize sweeper status")?;
            context.emit_line(&output);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{AppCommandResult, AppContext, execute_command_typed};
    use crate::AppCommand;
    use crate::monitor::MonitorEvent;

    #[tokio::test]
    async fn execute_command_typed_help_returns_help_variant() {
        let context = AppContext::from_env();
        let result = execute_command_typed(AppCommand::Help, &context)
            .await
            .expect("typed command execution should succeed");

        assert!(matches!(result, AppCommandResult::HelpText(text) if text.contains("Usage:")));
    }

    #[tokio::test]
    async fn summary_on_empty_monitor_is_low_risk() {
        let context = AppContext::from_env();
        let result = execute_command_typed(AppCommand::Summary, &context)
            .await
            .expect("summary should succeed");

        match result {
            AppCommandResult::Summary(summary) => {
                assert_eq!(summary.total_sensors, 0);
                assert_eq!(summary.risk_level, "LOW");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_watch_stops_and_reports_events() {
        let events: Arc<Mutex<Vec<MonitorEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let context = AppContext::from_env()
            .with_output_hook(Arc::new(|_| {}))
            .with_event_hook(Arc::new(move |event| {
                sink.lock()
                    .expect("event lock should not be poisoned")
                    .push(event.clone());
            }));
        context.cancel();

        let result = execute_command_typed(AppCommand::Watch { interval: Some(2) }, &context)
            .await
            .expect("watch should succeed");
        assert!(matches!(result, AppCommandResult::Watch(status) if !status.is_running));

        let captured = events.lock().expect("event lock should not be poisoned");
        assert_eq!(
            captured.first(),
            Some(&MonitorEvent::MonitoringStarted {
                interval_seconds: 2
            })
        );
    }

    #[test]
    fn context_cancel_flag_can_be_set_and_reset() {
        let context = AppContext::from_env();
        assert!(!context.is_cancelled());
        context.cancel();
        assert!(context.is_cancelled());
        context.reset_cancel();
        assert!(!context.is_cancelled());
    }
}
