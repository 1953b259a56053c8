//! 点位描述与换算参数。

use crate::DeviceEndpoint;

/// R 寄存器窗口类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Read,
    Write,
    Command,
    Value,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Command => "command",
            Self::Value => "value",
        }
    }
}

/// 点位操作类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// 只读遥测
    Telemetry,
    /// 写入命令（魔数）
    Command,
    /// 写入数值设定
    Value,
}

impl OperationClass {
    /// 该类别点位必须落入的窗口。
    pub fn window(&self) -> WindowKind {
        match self {
            Self::Telemetry => WindowKind::Read,
            Self::Command => WindowKind::Command,
            Self::Value => WindowKind::Value,
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Telemetry)
    }
}

/// 线性换算：`engineering = (raw - raw_base) * precision`。
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    pub raw_base: i32,
    pub precision: f64,
    pub raw_min: u16,
    pub raw_max: u16,
}

impl LinearScale {
    pub fn new(raw_base: i32, precision: f64, raw_min: u16, raw_max: u16) -> Self {
        Self {
            raw_base,
            precision,
            raw_min,
            raw_max,
        }
    }

    /// 不做换算的原始寄存器（整个 u16 范围）。
    pub fn identity() -> Self {
        Self::new(0, 1.0, 0, u16::MAX)
    }

    /// 工程量下限（对应 `raw_min`）。
    pub fn actual_min(&self) -> f64 {
        (i64::from(self.raw_min) - i64::from(self.raw_base)) as f64 * self.precision
    }

    /// 工程量上限（对应 `raw_max`）。
    pub fn actual_max(&self) -> f64 {
        (i64::from(self.raw_max) - i64::from(self.raw_base)) as f64 * self.precision
    }
}

/// 两态点位的状态表，例如液位开关 `0 -> Normal, 1 -> HighLevel`。
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTable {
    pub states: Vec<(u16, String)>,
}

impl StatusTable {
    pub fn new<'a>(states: impl IntoIterator<Item = (u16, &'a str)>) -> Self {
        Self {
            states: states
                .into_iter()
                .map(|(raw, label)| (raw, label.to_string()))
                .collect(),
        }
    }

    pub fn label(&self, raw: u16) -> Option<&str> {
        self.states
            .iter()
            .find(|(value, _)| *value == raw)
            .map(|(_, label)| label.as_str())
    }

    pub fn contains(&self, raw: u16) -> bool {
        self.states.iter().any(|(value, _)| *value == raw)
    }
}

/// 点位换算方式。
#[derive(Debug, Clone, PartialEq)]
pub enum PointKind {
    Linear(LinearScale),
    TwoState(StatusTable),
}

/// 点位描述：配置加载后不可变。
#[derive(Debug, Clone, PartialEq)]
pub struct PointDescriptor {
    pub key: String,
    pub r_number: u32,
    pub endpoint: DeviceEndpoint,
    pub class: OperationClass,
    pub kind: PointKind,
    pub unit: String,
    pub description: String,
}

impl PointDescriptor {
    /// 原始值合法范围（闭区间）。
    pub fn raw_range(&self) -> (u16, u16) {
        match &self.kind {
            PointKind::Linear(scale) => (scale.raw_min, scale.raw_max),
            PointKind::TwoState(table) => {
                let min = table.states.iter().map(|(raw, _)| *raw).min().unwrap_or(0);
                let max = table.states.iter().map(|(raw, _)| *raw).max().unwrap_or(0);
                (min, max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scale_reports_engineering_bounds() {
        let scale = LinearScale::new(3000, 0.1, 3000, 3600);
        assert_eq!(scale.actual_min(), 0.0);
        assert!((scale.actual_max() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn status_table_lookup() {
        let table = StatusTable::new([(0, "Normal"), (1, "HighLevel")]);
        assert_eq!(table.label(1), Some("HighLevel"));
        assert_eq!(table.label(2), None);
        assert!(table.contains(0));
    }
}
