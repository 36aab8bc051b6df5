use anyhow::{Context, Result};

use crate::app::{AppContext, execute_command_with_context};
use crate::cli::parse_cli_args;
use crate::seed::seed_demo_fleet;

/// Run the CLI against a monitor preloaded with the demo fleet.
pub async fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let context = demo_context()?;
    run_with_ctrl_c(args, &context).await
}

/// Context from the environment, seeded with the demo fleet at the monitor clock.
pub fn demo_context() -> Result<AppContext> {
    let context = AppContext::from_env();
    let monitor = context.monitor();
    seed_demo_fleet(monitor, monitor.now()).context("Failed to seed demo fleet")?;
    Ok(context)
}

/// Run the app with an explicit context (monitor and output hooks).
pub async fn run_with_context<I, S>(args: I, context: &AppContext) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let command = parse_cli_args(args)?;
    execute_command_with_context(command, context).await
}

/// Run the app with Ctrl+C cancellation wired into the provided context.
pub async fn run_with_ctrl_c<I, S>(args: I, context: &AppContext) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cancel_context = context.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_context.cancel();
            crate::log_stderr!("Cancellation requested (Ctrl+C). Stopping heartbeat sweeper...");
        }
    });

    let run_result = run_with_context(args, context).await;
    signal_task.abort();
    run_result
}
