//! 网关配置加载。
//!
//! - [`GatewayConfig`]：运行参数，来自 `PLCGW_*` 环境变量
//! - [`MachineProfile`]：机种配置（端点、窗口、点位、命令），来自 JSON 文件或内置 CDU 配置

mod cdu;
mod profile;

pub use cdu::default_cdu_profile;
pub use profile::{
    CommandSpec, EndpointSpec, MachineProfile, PointClassSpec, PointKindSpec, PointSpec,
    ResolvedProfile, StateSpec, WindowSpec, WindowsSpec, load_profile, profile_from_json,
};

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("cannot read profile {0}: {1}")]
    Io(String, String),
    #[error("profile parse error: {0}")]
    Parse(String),
    #[error("invalid profile: {0}")]
    Profile(String),
}

/// 网关运行参数。
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub max_connections_per_host: usize,
    pub acquire_timeout_ms: u64,
    pub io_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub reconnect_interval_ms: u64,
    pub idle_timeout_seconds: u64,
    pub confirm_value_writes: bool,
    pub alarm_major_threshold: usize,
    pub profile_path: Option<String>,
    /// 使用内存模拟 PLC 代替 Modbus TCP（本地演示）
    pub simulate: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_connections_per_host: 3,
            acquire_timeout_ms: 2000,
            io_timeout_ms: 3000,
            connect_timeout_ms: 3000,
            poll_interval_ms: 100,
            reconnect_interval_ms: 5000,
            idle_timeout_seconds: 300,
            confirm_value_writes: false,
            alarm_major_threshold: 5,
            profile_path: None,
            simulate: false,
        }
    }
}

impl GatewayConfig {
    /// 从环境变量读取配置，未设置的项取默认值。
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_connections_per_host = read_u64_with_default(
            "PLCGW_MAX_CONNECTIONS_PER_HOST",
            defaults.max_connections_per_host as u64,
        )?;
        let acquire_timeout_ms =
            read_u64_with_default("PLCGW_ACQUIRE_TIMEOUT_MS", defaults.acquire_timeout_ms)?;
        let io_timeout_ms = read_u64_with_default("PLCGW_IO_TIMEOUT_MS", defaults.io_timeout_ms)?;
        let connect_timeout_ms =
            read_u64_with_default("PLCGW_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms)?;
        let poll_interval_ms =
            read_u64_with_default("PLCGW_POLL_INTERVAL_MS", defaults.poll_interval_ms)?;
        let reconnect_interval_ms =
            read_u64_with_default("PLCGW_RECONNECT_INTERVAL_MS", defaults.reconnect_interval_ms)?;
        let idle_timeout_seconds =
            read_u64_with_default("PLCGW_IDLE_TIMEOUT_SECONDS", defaults.idle_timeout_seconds)?;
        let confirm_value_writes =
            read_bool_with_default("PLCGW_CONFIRM_VALUE_WRITES", defaults.confirm_value_writes);
        let alarm_major_threshold = read_u64_with_default(
            "PLCGW_ALARM_MAJOR_THRESHOLD",
            defaults.alarm_major_threshold as u64,
        )?;
        let profile_path = read_optional("PLCGW_PROFILE_PATH");
        let simulate = read_bool_with_default("PLCGW_SIMULATE", defaults.simulate);

        ensure_positive("PLCGW_MAX_CONNECTIONS_PER_HOST", max_connections_per_host)?;
        ensure_positive("PLCGW_POLL_INTERVAL_MS", poll_interval_ms)?;
        ensure_positive("PLCGW_RECONNECT_INTERVAL_MS", reconnect_interval_ms)?;
        ensure_positive("PLCGW_ALARM_MAJOR_THRESHOLD", alarm_major_threshold)?;

        Ok(Self {
            max_connections_per_host: max_connections_per_host as usize,
            acquire_timeout_ms,
            io_timeout_ms,
            connect_timeout_ms,
            poll_interval_ms,
            reconnect_interval_ms,
            idle_timeout_seconds,
            confirm_value_writes,
            alarm_major_threshold: alarm_major_threshold as usize,
            profile_path,
            simulate,
        })
    }

    /// 加载机种配置：设置了 `profile_path` 时读文件，否则使用内置 CDU 配置。
    pub fn machine_profile(&self) -> Result<MachineProfile, ConfigError> {
        match &self.profile_path {
            Some(path) => load_profile(path),
            None => Ok(default_cdu_profile()),
        }
    }
}

fn ensure_positive(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(key.to_string(), value.to_string()));
    }
    Ok(())
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
