use domain::{CommandOutcome, DecodedFlag, PointReading, WriteValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单点读取返回结构。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointReadingDto {
    pub r_number: u32,
    pub raw: u16,
    pub engineering: Option<f64>,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub stale: bool,
    pub timestamp: i64,
}

impl From<&PointReading> for PointReadingDto {
    fn from(reading: &PointReading) -> Self {
        Self {
            r_number: reading.r_number,
            raw: reading.raw,
            engineering: reading.engineering,
            unit: reading.unit.clone(),
            label: reading.label.clone(),
            stale: reading.stale,
            timestamp: reading.ts_ms,
        }
    }
}

/// 批量读取请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadBatchRequest {
    pub start_r: u32,
    pub count: usize,
}

/// 单点写入请求体：`raw` 与 `engineering` 二选一。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritePointRequest {
    pub r_number: u32,
    pub raw: Option<u16>,
    pub engineering: Option<f64>,
}

impl WritePointRequest {
    /// 两者都给或都不给时返回 `None`。
    pub fn value(&self) -> Option<WriteValue> {
        match (self.raw, self.engineering) {
            (Some(raw), None) => Some(WriteValue::Raw(raw)),
            (None, Some(value)) => Some(WriteValue::Engineering(value)),
            _ => None,
        }
    }
}

/// 批量写入请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBatchRequest {
    pub start_r: u32,
    pub values: Vec<u16>,
}

/// 命令执行请求体。
#[derive(Debug, Deserialize)]
pub struct ExecuteCommandRequest {
    pub name: String,
}

/// 写入/命令结果。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcomeDto {
    pub outcome_id: String,
    pub endpoint: String,
    pub r_number: u32,
    pub written: Vec<u16>,
    pub engineering: Option<f64>,
    pub readback: Option<Vec<u16>>,
    pub confirmation: String,
    pub confirmed: bool,
    pub timestamp: i64,
}

impl From<&CommandOutcome> for CommandOutcomeDto {
    fn from(outcome: &CommandOutcome) -> Self {
        Self {
            outcome_id: outcome.outcome_id.clone(),
            endpoint: outcome.endpoint.to_string(),
            r_number: outcome.r_number,
            written: outcome.written.clone(),
            engineering: outcome.engineering,
            readback: outcome.readback.clone(),
            confirmation: outcome.confirmation.as_str().to_string(),
            confirmed: outcome.confirmed(),
            timestamp: outcome.ts_ms,
        }
    }
}

/// 位标志解析结果。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedFlagDto {
    pub register: u32,
    pub bit: u8,
    pub code: String,
    pub name: String,
    pub value: u8,
    pub active: bool,
    pub reserved: bool,
    pub status: String,
}

impl From<&DecodedFlag> for DecodedFlagDto {
    fn from(flag: &DecodedFlag) -> Self {
        Self {
            register: flag.register,
            bit: flag.bit,
            code: flag.code.clone(),
            name: flag.name.clone(),
            value: flag.value,
            active: flag.active,
            reserved: flag.reserved,
            status: flag.status.clone(),
        }
    }
}

/// 状态快照。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshotDto {
    pub raw_register_value: u16,
    pub decoded_flags: Vec<DecodedFlagDto>,
    pub overall_label: String,
    pub power_on: bool,
    pub running: bool,
    pub standby: bool,
    pub water_filling: bool,
    pub abnormal: bool,
    pub stale: bool,
    pub timestamp: i64,
}

/// 单个异常寄存器的解析结果。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDecodeDto {
    pub register: u32,
    pub raw: u16,
    pub flags: Vec<DecodedFlagDto>,
}

/// 异常快照。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSnapshotDto {
    pub per_register: Vec<RegisterDecodeDto>,
    pub active_flags: Vec<DecodedFlagDto>,
    pub critical_flags: Vec<DecodedFlagDto>,
    pub total_active: usize,
    pub severity: String,
    pub categories: BTreeMap<String, usize>,
    pub stale: bool,
    pub timestamp: i64,
}

/// 数值设定点。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSettingDto {
    pub key: String,
    pub r_number: u32,
    pub description: String,
    pub unit: String,
    pub reading: Option<PointReadingDto>,
}

/// 命令表条目。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDto {
    pub name: String,
    pub endpoint: String,
    pub r_number: u32,
    pub value: u16,
    pub description: String,
}

/// 连接池状态。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatsDto {
    pub outstanding: usize,
    pub idle: usize,
    pub created: u64,
    pub discarded: u64,
    pub high_water: usize,
}

/// 端点链路状态。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStatusDto {
    pub endpoint: String,
    pub state: String,
    pub pool: PoolStatsDto,
}
