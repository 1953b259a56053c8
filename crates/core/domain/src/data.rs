use crate::DeviceEndpoint;

/// 最后已知值：每次成功读取或确认写入后覆盖，不单独删除。
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub endpoint: DeviceEndpoint,
    pub r_number: u32,
    pub raw: u16,
    pub ts_ms: i64,
}

/// 单个点位的读取结果。
#[derive(Debug, Clone, PartialEq)]
pub struct PointReading {
    pub r_number: u32,
    pub raw: u16,
    /// 原始值超出声明范围时为 `None`
    pub engineering: Option<f64>,
    pub unit: String,
    /// 两态标签或范围状态（`Normal` / `BelowRange` / `AboveRange`）
    pub label: Option<String>,
    pub stale: bool,
    pub ts_ms: i64,
}

/// 写入值：原始寄存器值或工程量。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteValue {
    Raw(u16),
    Engineering(f64),
}

/// 回读确认状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
    Mismatch,
}

impl Confirmation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Unconfirmed => "unconfirmed",
            Self::Mismatch => "mismatch",
        }
    }
}

/// 命令/数值写入结果。
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub outcome_id: String,
    pub endpoint: DeviceEndpoint,
    /// 起始 R 寄存器
    pub r_number: u32,
    pub written: Vec<u16>,
    pub engineering: Option<f64>,
    pub readback: Option<Vec<u16>>,
    pub confirmation: Confirmation,
    pub ts_ms: i64,
}

impl CommandOutcome {
    pub fn confirmed(&self) -> bool {
        self.confirmation == Confirmation::Confirmed
    }
}
