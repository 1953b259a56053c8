//! PLC 网关守护进程：装配连接池与网关，启动端点守护任务并定期输出快照。

mod view;

use api_contract::ApiResponse;
use domain::WindowKind;
use plcgw_alarm::STATUS_REGISTER;
use plcgw_config::{GatewayConfig, ResolvedProfile};
use plcgw_gateway::{Gateway, GatewayError};
use plcgw_protocol::{
    ModbusTcpConfig, ModbusTcpConnector, SessionConnector, SimulatedConnector, SimulatedPlc,
};
use plcgw_telemetry::init_tracing;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use view::{MetricsDto, alarm_dto, command_dto, link_dto, status_dto, value_setting_dto};

const REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = GatewayConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 机种配置：PLCGW_PROFILE_PATH 指定文件，否则使用内置 CDU 配置
    let profile = config.machine_profile()?.resolve()?;
    info!(
        target: "plcgw.app",
        profile = %profile.name,
        endpoints = profile.endpoints.len(),
        points = profile.points.len(),
        commands = profile.commands.len(),
        simulate = config.simulate,
        "profile_loaded"
    );

    let connector: Arc<dyn SessionConnector> = if config.simulate {
        let connector = SimulatedConnector::new();
        for endpoint in &profile.endpoints {
            seed_simulator(&connector.attach(endpoint), &profile);
        }
        Arc::new(connector)
    } else {
        Arc::new(ModbusTcpConnector::new(ModbusTcpConfig {
            connect_timeout_ms: config.connect_timeout_ms,
        }))
    };

    let gateway = Gateway::from_config(profile, connector, &config)?;
    for command in gateway.commands() {
        let dto = command_dto(&command);
        info!(
            target: "plcgw.app",
            name = %dto.name,
            endpoint = %dto.endpoint,
            r_number = dto.r_number,
            value = dto.value,
            "command_registered"
        );
    }

    // 首次探测，随后由守护任务接管重连与轮询
    gateway.connect().await;
    let tasks = gateway.start();
    let reporter = tokio::spawn(report_loop(gateway.clone()));
    info!(target: "plcgw.app", tasks = tasks.len(), "gateway_started");

    tokio::signal::ctrl_c().await?;
    info!(target: "plcgw.app", "shutdown_requested");
    reporter.abort();
    tasks.shutdown();
    Ok(())
}

/// 模拟 PLC 的初始寄存器：状态寄存器置上电，点位取各自下限。
fn seed_simulator(plc: &SimulatedPlc, profile: &ResolvedProfile) {
    let Some(base) = profile
        .windows
        .iter()
        .find(|window| window.kind == WindowKind::Read)
        .map(|window| window.base)
    else {
        return;
    };
    let offset = |r_number: u32| {
        r_number
            .checked_sub(base)
            .and_then(|offset| u16::try_from(offset).ok())
    };
    if let Some(address) = offset(STATUS_REGISTER) {
        plc.set_register(address, 0b0000_0001);
    }
    for point in &profile.points {
        if let Some(address) = offset(point.r_number) {
            plc.set_register(address, point.raw_range().0);
        }
    }
}

async fn report_loop(gateway: Gateway) {
    let mut ticker = tokio::time::interval(REPORT_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        report_once(&gateway).await;
    }
}

async fn report_once(gateway: &Gateway) {
    for endpoint in gateway.endpoints() {
        let dto = link_dto(
            endpoint,
            gateway.link_state(endpoint),
            gateway.pool_stats(endpoint),
        );
        emit("link", &ApiResponse::success(dto));
        match gateway.cached_values(endpoint).await {
            Ok(values) => info!(
                target: "plcgw.report",
                endpoint = %endpoint,
                cached = values.len(),
                newest_ms = values.iter().map(|value| value.ts_ms).max().unwrap_or_default(),
                "cache_summary"
            ),
            Err(err) => emit_error("link", &err),
        }
    }

    match gateway.status_snapshot().await {
        Ok(snapshot) => emit("status", &ApiResponse::success(status_dto(&snapshot))),
        Err(err) => emit_error("status", &err),
    }
    match gateway.alarm_snapshot().await {
        Ok(snapshot) => emit("alarm", &ApiResponse::success(alarm_dto(&snapshot))),
        Err(err) => emit_error("alarm", &err),
    }

    let settings: Vec<_> = gateway
        .value_settings()
        .await
        .iter()
        .map(value_setting_dto)
        .collect();
    emit("values", &ApiResponse::success(settings));

    let metrics = gateway.metrics();
    emit("metrics", &ApiResponse::success(MetricsDto::from(&metrics)));
}

fn emit<T: Serialize>(section: &'static str, response: &ApiResponse<T>) {
    match serde_json::to_string(response) {
        Ok(body) => info!(target: "plcgw.report", section, body = %body, "snapshot"),
        Err(err) => warn!(target: "plcgw.report", section, error = %err, "snapshot_encode_failed"),
    }
}

fn emit_error(section: &'static str, err: &GatewayError) {
    warn!(
        target: "plcgw.report",
        section,
        kind = err.kind().as_str(),
        error = %err,
        "snapshot_unavailable"
    );
    emit(section, &ApiResponse::<()>::failure(err.kind(), err.to_string()));
}
