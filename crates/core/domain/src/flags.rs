//! 位标志描述与解析结果。

/// 静态位标志表条目。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFlagDescriptor {
    pub register: u32,
    pub bit: u8,
    pub code: &'static str,
    pub name: &'static str,
    /// 位为 0 时的含义
    pub off_text: &'static str,
    /// 位为 1 时的含义
    pub on_text: &'static str,
}

/// 单个位的解析结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFlag {
    pub register: u32,
    pub bit: u8,
    pub code: String,
    pub name: String,
    pub value: u8,
    pub active: bool,
    pub reserved: bool,
    pub status: String,
}

/// 异常严重度，按优先级排序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Normal,
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Minor => "Minor",
            Self::Major => "Major",
            Self::Critical => "Critical",
        }
    }
}

/// 状态寄存器的整体标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverallLabel {
    Abnormal,
    PoweredOff,
    Standby,
    Running,
    PoweredOnIdle,
}

impl OverallLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abnormal => "Abnormal",
            Self::PoweredOff => "PoweredOff",
            Self::Standby => "Standby",
            Self::Running => "Running",
            Self::PoweredOnIdle => "PoweredOnIdle",
        }
    }
}
