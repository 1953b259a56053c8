//! 快照类型

use domain::{PointDescriptor, PointReading};
use plcgw_alarm::{AlarmSummary, StatusSummary};

/// 状态寄存器快照。
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub summary: StatusSummary,
    pub stale: bool,
    pub ts_ms: i64,
}

/// 异常寄存器快照。`ts_ms` 取参与汇总的最旧样本。
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSnapshot {
    pub summary: AlarmSummary,
    pub stale: bool,
    pub ts_ms: i64,
}

/// 数值设定点的当前值，设备不可读且无缓存时 `reading` 为空。
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSetting {
    pub point: PointDescriptor,
    pub reading: Option<PointReading>,
}
