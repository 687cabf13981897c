use bridge_app::{
    AppError, ConfigValidation, HealthReport, MonitorInfo, Result, ServiceDescriptor,
};
use tracing::info;
use usage_core::{MAX_RESET_HOUR, SessionBlock, UsageConfig};

use crate::{
    AppContext, BridgeSettingsResponse, SessionsRequest, UsageStatsRequest, UsageStatsResponse,
};

const DEFAULT_HOURS_BACK: u32 = 24;
const MAX_HOURS_BACK: u32 = 168;

fn check_stats_query(req: &UsageStatsRequest) -> Result<()> {
    if req.custom_limit_tokens == Some(0) {
        return Err(AppError::InvalidInput(
            "custom_limit_tokens must be greater than 0".to_string(),
        ));
    }
    if let Some(hour) = req.reset_hour
        && hour > MAX_RESET_HOUR
    {
        return Err(AppError::InvalidInput(format!(
            "reset_hour must be between 0 and {}, got {}",
            MAX_RESET_HOUR, hour
        )));
    }
    Ok(())
}

fn resolve_hours_back(hours_back: Option<u32>) -> Result<u32> {
    let hours = hours_back.unwrap_or(DEFAULT_HOURS_BACK);
    if !(1..=MAX_HOURS_BACK).contains(&hours) {
        return Err(AppError::InvalidInput(format!(
            "hours_back must be between 1 and {}, got {}",
            MAX_HOURS_BACK, hours
        )));
    }
    Ok(hours)
}

pub fn health(ctx: &AppContext) -> Result<HealthReport> {
    Ok(ctx.app_state.services.monitor.health())
}

pub fn service_info(ctx: &AppContext) -> Result<ServiceDescriptor> {
    Ok(ctx.app_state.services.monitor.descriptor())
}

pub fn monitor_info(ctx: &AppContext) -> Result<MonitorInfo> {
    Ok(ctx.app_state.services.monitor.info())
}

pub fn usage_stats(ctx: &AppContext, req: UsageStatsRequest) -> Result<UsageStatsResponse> {
    check_stats_query(&req)?;
    let config = ctx.app_state.services.config.effective(&req)?;
    let outcome = ctx.app_state.services.stats.get_statistics(Some(&config));
    Ok(UsageStatsResponse {
        stats: outcome.value,
        degradation: outcome.degradation,
    })
}

pub fn usage_config_get(ctx: &AppContext) -> Result<UsageConfig> {
    ctx.app_state.services.config.get()
}

pub fn usage_config_put(ctx: &AppContext, config: UsageConfig) -> Result<UsageConfig> {
    let validation = ctx.app_state.services.stats.validate_configuration(&config);
    if !validation.valid {
        let reason = validation
            .error
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(AppError::InvalidInput(format!(
            "invalid configuration: {}",
            reason
        )));
    }
    let saved = ctx.app_state.services.config.put(config)?;
    info!(plan = saved.plan.as_str(), "usage config saved");
    Ok(saved)
}

pub fn usage_sessions(ctx: &AppContext, req: SessionsRequest) -> Result<Vec<SessionBlock>> {
    let hours_back = resolve_hours_back(req.hours_back)?;
    Ok(ctx
        .app_state
        .services
        .stats
        .get_session_history(hours_back)
        .into_value())
}

pub fn validate_config(ctx: &AppContext, config: UsageConfig) -> Result<ConfigValidation> {
    Ok(ctx.app_state.services.stats.validate_configuration(&config))
}

pub fn bridge_settings(ctx: &AppContext) -> Result<BridgeSettingsResponse> {
    let config = &ctx.app_state.config;
    let info = ctx.app_state.services.monitor.info();
    Ok(BridgeSettingsResponse {
        debug: config.bridge.debug,
        log_level: config.bridge.log_level.clone(),
        python: config.bridge.python.to_string_lossy().to_string(),
        monitor_path: config
            .bridge
            .monitor_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
        monitor_root: info.root,
        app_data_dir: ctx.app_data_dir.to_string_lossy().to_string(),
        usage_config_path: config.paths.usage_config_path.to_string_lossy().to_string(),
    })
}
