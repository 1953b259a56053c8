//! 网关快照到 API DTO 的转换。

use api_contract::{
    AlarmSnapshotDto, CommandDto, DecodedFlagDto, LinkStatusDto, PointReadingDto, PoolStatsDto,
    RegisterDecodeDto, StatusSnapshotDto, ValueSettingDto,
};
use domain::DeviceEndpoint;
use plcgw_control::CommandDefinition;
use plcgw_gateway::{AlarmSnapshot, LinkState, StatusSnapshot, ValueSetting};
use plcgw_protocol::PoolStats;
use plcgw_telemetry::MetricsSnapshot;
use serde::Serialize;

pub fn status_dto(snapshot: &StatusSnapshot) -> StatusSnapshotDto {
    let summary = &snapshot.summary;
    StatusSnapshotDto {
        raw_register_value: summary.raw,
        decoded_flags: summary.flags.iter().map(DecodedFlagDto::from).collect(),
        overall_label: summary.overall.as_str().to_string(),
        power_on: summary.power_on,
        running: summary.running,
        standby: summary.standby,
        water_filling: summary.water_filling,
        abnormal: summary.abnormal,
        stale: snapshot.stale,
        timestamp: snapshot.ts_ms,
    }
}

pub fn alarm_dto(snapshot: &AlarmSnapshot) -> AlarmSnapshotDto {
    let summary = &snapshot.summary;
    AlarmSnapshotDto {
        per_register: summary
            .registers
            .iter()
            .map(|decode| RegisterDecodeDto {
                register: decode.register,
                raw: decode.raw,
                flags: decode.flags.iter().map(DecodedFlagDto::from).collect(),
            })
            .collect(),
        active_flags: summary.active.iter().map(DecodedFlagDto::from).collect(),
        critical_flags: summary.critical.iter().map(DecodedFlagDto::from).collect(),
        total_active: summary.total_active,
        severity: summary.severity.as_str().to_string(),
        categories: summary
            .categories
            .iter()
            .map(|(category, count)| (category.as_str().to_string(), *count))
            .collect(),
        stale: snapshot.stale,
        timestamp: snapshot.ts_ms,
    }
}

pub fn value_setting_dto(setting: &ValueSetting) -> ValueSettingDto {
    ValueSettingDto {
        key: setting.point.key.clone(),
        r_number: setting.point.r_number,
        description: setting.point.description.clone(),
        unit: setting.point.unit.clone(),
        reading: setting.reading.as_ref().map(PointReadingDto::from),
    }
}

pub fn command_dto(command: &CommandDefinition) -> CommandDto {
    CommandDto {
        name: command.name.clone(),
        endpoint: command.endpoint.to_string(),
        r_number: command.r_number,
        value: command.value,
        description: command.description.clone(),
    }
}

pub fn link_dto(endpoint: &DeviceEndpoint, state: LinkState, stats: PoolStats) -> LinkStatusDto {
    LinkStatusDto {
        endpoint: endpoint.to_string(),
        state: state.as_str().to_string(),
        pool: PoolStatsDto {
            outstanding: stats.outstanding,
            idle: stats.idle,
            created: stats.created,
            discarded: stats.discarded,
            high_water: stats.high_water,
        },
    }
}

/// 运行计数器摘要。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDto {
    pub reads_ok: u64,
    pub reads_failed: u64,
    pub reads_stale: u64,
    pub writes_ok: u64,
    pub writes_failed: u64,
    pub readback_mismatch: u64,
    pub commands_executed: u64,
    pub pool_waits: u64,
    pub pool_exhausted: u64,
    pub poll_cycles: u64,
    pub link_transitions: u64,
    pub avg_io_latency_ms: u64,
}

impl From<&MetricsSnapshot> for MetricsDto {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            reads_ok: snapshot.reads_ok,
            reads_failed: snapshot.reads_failed,
            reads_stale: snapshot.reads_stale,
            writes_ok: snapshot.writes_ok,
            writes_failed: snapshot.writes_failed,
            readback_mismatch: snapshot.readback_mismatch,
            commands_executed: snapshot.commands_executed,
            pool_waits: snapshot.pool_waits,
            pool_exhausted: snapshot.pool_exhausted,
            poll_cycles: snapshot.poll_cycles,
            link_transitions: snapshot.link_transitions,
            avg_io_latency_ms: snapshot.avg_io_latency_ms(),
        }
    }
}
