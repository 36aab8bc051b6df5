use anyhow::Result;

use crate::alerts::AlertStatus;
use crate::command::{AppCommand, ExportFormat};
use crate::config::DEFAULT_SWEEP_INTERVAL;
use crate::models::DetectionType;

pub type CliCommand = AppCommand;

pub fn version_text() -> String {
    format!("railwatch {}", env!("CARGO_PKG_VERSION"))
}

pub fn usage_text() -> String {
    format!(
        "{version}
Railway safety monitor: sensor heartbeats, track status and alert lifecycle

Usage:
  railwatch [summary]
  railwatch snapshot
  railwatch alerts [--status <STATUS>] [--type <TYPE>] [--format <FORMAT>]
  railwatch watch [--interval <SECS>]
  railwatch --help
  railwatch --version

Options:
      --status <STATUS>   Alerts: active | investigating | resolved
      --type <TYPE>       Alerts: person | animal
      --format <FORMAT>   Alerts: json | csv (default: json)
      --interval <SECS>   Watch: heartbeat sweep interval (default: {default_interval})
  -h, --help              Show this help text
  -V, --version           Show version",
        version = version_text(),
        default_interval = DEFAULT_SWEEP_INTERVAL
    )
}

fn invalid_value(flag: &str, raw: &str, expected: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid value for {}: '{}'. Expected {}.\n\n{}",
        flag,
        raw,
        expected,
        usage_text()
    )
}

fn parse_interval_arg(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| invalid_value("--interval", raw, "a positive integer"))
}

fn parse_status_arg(raw: &str) -> Result<AlertStatus> {
    AlertStatus::parse(raw)
        .ok_or_else(|| invalid_value("--status", raw, "active, investigating or resolved"))
}

fn parse_type_arg(raw: &str) -> Result<DetectionType> {
    raw.parse::<DetectionType>()
        .map_err(|_| invalid_value("--type", raw, "person or animal"))
}

fn parse_format_arg(raw: &str) -> Result<ExportFormat> {
    ExportFormat::parse(raw).ok_or_else(|| invalid_value("--format", raw, "json or csv"))
}

/// Split `--flag=value`, or take the next argument for `--flag value`.
fn flag_value<I, S>(flag: &str, inline: Option<&str>, iter: &mut I) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let value = match inline {
        Some(value) => value.to_string(),
        None => iter
            .next()
            .map(|v| v.as_ref().to_string())
            .unwrap_or_default(),
    };
    if value.is_empty() {
        return Err(anyhow::anyhow!(
            "Missing value for {}.\n\n{}",
            flag,
            usage_text()
        ));
    }
    Ok(value)
}

pub fn parse_cli_args<I, S>(args: I) -> Result<CliCommand>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut iter = args.into_iter();
    let _program_name = iter.next();

    let mut command: Option<String> = None;
    let mut status: Option<AlertStatus> = None;
    let mut detection_type: Option<DetectionType> = None;
    let mut format: Option<ExportFormat> = None;
    let mut interval: Option<u64> = None;

    while let Some(arg) = iter.next() {
        let arg = arg.as_ref().to_string();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value)),
            _ => (arg.as_str(), None),
        };

        match flag {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-V" | "--version" => return Ok(CliCommand::Version),
            "snapshot" | "summary" | "alerts" | "watch" => {
                if command.as_deref().is_some_and(|existing| existing != flag) {
                    return Err(anyhow::anyhow!(
                        "Multiple commands provided. Use only one command.\n\n{}",
                        usage_text()
                    ));
                }
                command = Some(flag.to_string());
            }
            "--status" => {
                status = Some(parse_status_arg(&flag_value(flag, inline, &mut iter)?)?);
            }
            "--type" => {
                detection_type = Some(parse_type_arg(&flag_value(flag, inline, &mut iter)?)?);
            }
            "--format" => {
                format = Some(parse_format_arg(&flag_value(flag, inline, &mut iter)?)?);
            }
            "--interval" => {
                interval = Some(parse_interval_arg(&flag_value(flag, inline, &mut iter)?)?);
            }
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown argument: {arg}\n\n{}",
                    usage_text()
                ));
            }
        }
    }

    let has_alert_flags = status.is_some() || detection_type.is_some() || format.is_some();

    match command.as_deref().unwrap_or("summary") {
        "alerts" => {
            if interval.is_some() {
                return Err(anyhow::anyhow!(
                    "--interval is only valid with watch.\n\n{}",
                    usage_text()
                ));
            }
            Ok(CliCommand::Alerts {
                status,
                detection_type,
                format: format.unwrap_or_default(),
            })
        }
        "watch" => {
            if has_alert_flags {
                return Err(anyhow::anyhow!(
                    "--status/--type/--format are only valid with alerts.\n\n{}",
                    usage_text()
                ));
            }
            Ok(CliCommand::Watch { interval })
        }
        other => {
            if has_alert_flags || interval.is_some() {
                return Err(anyhow::anyhow!(
                    "--status/--type/--format/--interval are not valid with {}.\n\n{}",
                    other,
                    usage_text()
                ));
            }
            if other == "snapshot" {
                Ok(CliCommand::Snapshot)
            } else {
                Ok(CliCommand::Summary)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_help_flag() {
        let parsed = parse_cli_args(["railwatch", "--help"]).expect("help args should parse");
        assert_eq!(parsed, CliCommand::Help);
    }

    #[test]
    fn parse_version_flag() {
        let parsed = parse_cli_args(["railwatch", "-V"]).expect("version args should parse");
        assert_eq!(parsed, CliCommand::Version);
    }

    #[test]
    fn parse_default_summary_command() {
        let parsed = parse_cli_args(["railwatch"]).expect("default args should parse");
        assert_eq!(parsed, CliCommand::Summary);
    }

    #[test]
    fn parse_snapshot_command() {
        let parsed = parse_cli_args(["railwatch", "snapshot"]).expect("snapshot should parse");
        assert_eq!(parsed, CliCommand::Snapshot);
    }

    #[test]
    fn parse_alerts_with_filters() {
        let args = [
            "railwatch",
            "alerts",
            "--status",
            "Investigating",
            "--type=animal",
            "--format",
            "csv",
        ];
        let parsed = parse_cli_args(args).expect("alerts with filters should parse");
        assert_eq!(
            parsed,
            CliCommand::Alerts {
                status: Some(AlertStatus::Investigating),
                detection_type: Some(DetectionType::Animal),
                format: ExportFormat::Csv,
            }
        );
    }

    #[test]
    fn parse_alerts_defaults_to_json() {
        let parsed = parse_cli_args(["railwatch", "alerts"]).expect("alerts should parse");
        assert_eq!(
            parsed,
            CliCommand::Alerts {
                status: None,
                detection_type: None,
                format: ExportFormat::Json,
            }
        );
    }

    #[test]
    fn parse_watch_with_interval() {
        let parsed =
            parse_cli_args(["railwatch", "watch", "--interval", "10"]).expect("watch should parse");
        assert_eq!(parsed, CliCommand::Watch { interval: Some(10) });
    }

    #[test]
    fn parse_watch_rejects_zero_interval() {
        let err = parse_cli_args(["railwatch", "watch", "--interval=0"])
            .expect_err("zero interval should fail");
        assert!(err.to_string().contains("Invalid value for --interval"));
    }

    #[test]
    fn parse_alerts_rejects_unknown_type() {
        let err = parse_cli_args(["railwatch", "alerts", "--type", "vehicle"])
            .expect_err("unknown detection type should fail");
        assert!(err.to_string().contains("Expected person or animal"));
    }

    #[test]
    fn parse_summary_rejects_alert_flags() {
        let err = parse_cli_args(["railwatch", "summary", "--status", "active"])
            .expect_err("summary should reject alert filters");
        assert!(err.to_string().contains("not valid with summary"));
    }

    #[test]
    fn parse_watch_rejects_alert_flags() {
        let err = parse_cli_args(["railwatch", "watch", "--format", "csv"])
            .expect_err("watch should reject alert flags");
        assert!(err.to_string().contains("only valid with alerts"));
    }

    #[test]
    fn parse_missing_flag_value_errors() {
        let err = parse_cli_args(["railwatch", "alerts", "--status"])
            .expect_err("missing value should fail");
        assert!(err.to_string().contains("Missing value for --status"));
    }

    #[test]
    fn parse_multiple_commands_errors() {
        let err = parse_cli_args(["railwatch", "summary", "alerts"])
            .expect_err("two commands should fail");
        assert!(err.to_string().contains("Multiple commands"));
    }

    #[test]
    fn parse_unknown_argument_errors() {
        let err = parse_cli_args(["railwatch", "--unknown"]).expect_err("unknown flag should fail");
        assert!(err.to_string().contains("Unknown argument"));
    }
}
