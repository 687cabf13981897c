use std::io;

use app_api::{
    AppContext, UsageStatsRequest, UsageStatsResponse, health, monitor_info, service_info,
    usage_stats,
};
use bridge_app::config::default_config_file;
use bridge_app::{
    ApiError, AppState, BridgeConfig, HealthReport, MonitorInfo, ServiceDescriptor, logging,
};
use serde::Serialize;
use tracing::error;

/// One-shot report printed to stdout as JSON.
#[derive(Serialize)]
struct Snapshot {
    service: ServiceDescriptor,
    health: HealthReport,
    monitor: MonitorInfo,
    usage: UsageStatsResponse,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = default_config_file();
    let bridge = BridgeConfig::load(config_file.as_deref())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    logging::init(&bridge);

    let app_state = AppState::from_bridge_config(bridge);
    app_state.initialize().map_err(|err| {
        error!(error = %err, "failed to initialize usage bridge");
        io::Error::other(err.to_string())
    })?;
    let ctx = AppContext::new(app_state);

    let snapshot = snapshot(&ctx).map_err(|err| {
        let api = ApiError::from(err);
        io::Error::other(format!("{} ({})", api.message, api.status))
    })?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn snapshot(ctx: &AppContext) -> bridge_app::Result<Snapshot> {
    Ok(Snapshot {
        service: service_info(ctx)?,
        health: health(ctx)?,
        monitor: monitor_info(ctx)?,
        usage: usage_stats(ctx, UsageStatsRequest::default())?,
    })
}
