//! railwatch: railway safety monitor CLI
//!
//! Loads the demo fleet and prints dashboard views, or streams heartbeat
//! sweeper events with `watch`.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = railwatch_core::logging::init_logging() {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    if let Err(e) = railwatch_core::run(std::env::args()).await {
        railwatch_core::log_error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
