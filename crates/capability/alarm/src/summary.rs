//! 状态与异常汇总

use crate::decode::decode;
use crate::tables::{
    ALARM_REGISTERS, STATUS_BIT_ABNORMAL, STATUS_BIT_POWER, STATUS_BIT_RUNNING,
    STATUS_BIT_STANDBY, STATUS_BIT_WATER_FILLING, STATUS_REGISTER,
};
use domain::{DecodedFlag, OverallLabel, Severity};
use std::collections::BTreeMap;

/// 状态寄存器汇总。
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub raw: u16,
    pub flags: Vec<DecodedFlag>,
    pub power_on: bool,
    pub running: bool,
    pub standby: bool,
    pub water_filling: bool,
    pub abnormal: bool,
    pub overall: OverallLabel,
}

fn bit_set(raw: u16, bit: u8) -> bool {
    (raw >> bit) & 1 == 1
}

/// 整体标签优先级：异常 > 未上电 > 待机 > 运转 > 上电空闲。
pub fn overall_label(raw: u16) -> OverallLabel {
    if bit_set(raw, STATUS_BIT_ABNORMAL) {
        OverallLabel::Abnormal
    } else if !bit_set(raw, STATUS_BIT_POWER) {
        OverallLabel::PoweredOff
    } else if bit_set(raw, STATUS_BIT_STANDBY) {
        OverallLabel::Standby
    } else if bit_set(raw, STATUS_BIT_RUNNING) {
        OverallLabel::Running
    } else {
        OverallLabel::PoweredOnIdle
    }
}

pub fn summarize_status(raw: u16) -> StatusSummary {
    StatusSummary {
        raw,
        flags: decode(STATUS_REGISTER, raw).into_values().collect(),
        power_on: bit_set(raw, STATUS_BIT_POWER),
        running: bit_set(raw, STATUS_BIT_RUNNING),
        standby: bit_set(raw, STATUS_BIT_STANDBY),
        water_filling: bit_set(raw, STATUS_BIT_WATER_FILLING),
        abnormal: bit_set(raw, STATUS_BIT_ABNORMAL),
        overall: overall_label(raw),
    }
}

/// 异常分类（按名称关键字首个命中归类）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlarmCategory {
    Pump,
    Temperature,
    Pressure,
    Communication,
    Sensor,
    System,
    Other,
}

impl AlarmCategory {
    pub const ALL: [AlarmCategory; 7] = [
        Self::Pump,
        Self::Temperature,
        Self::Pressure,
        Self::Communication,
        Self::Sensor,
        Self::System,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pump => "pump",
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Communication => "communication",
            Self::Sensor => "sensor",
            Self::System => "system",
            Self::Other => "other",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Pump => &["pump"],
            Self::Temperature => &["temperature", "temp", "t1"],
            Self::Pressure => &["pressure", "p1", "p2"],
            Self::Communication => &["communication", "modbus", "comm"],
            Self::Sensor => &["sensor", "wiring", "probe"],
            Self::System => &["plc", "module", "system"],
            Self::Other => &[],
        }
    }

    /// 按名称归类。
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| {
                category
                    .keywords()
                    .iter()
                    .any(|keyword| name.contains(keyword))
            })
            .unwrap_or(Self::Other)
    }
}

/// 严重度判定参数。
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmPolicy {
    /// 命中任一关键字的异常视为关键异常（小写匹配）
    pub critical_keywords: Vec<String>,
    /// 活动异常数达到该值判定为 Major
    pub major_threshold: usize,
}

impl Default for AlarmPolicy {
    fn default() -> Self {
        Self {
            critical_keywords: ["pump", "system", "plc", "dual", "level insufficient"]
                .into_iter()
                .map(String::from)
                .collect(),
            major_threshold: 5,
        }
    }
}

impl AlarmPolicy {
    pub fn is_critical(&self, flag: &DecodedFlag) -> bool {
        let name = flag.name.to_lowercase();
        self.critical_keywords
            .iter()
            .any(|keyword| name.contains(&keyword.to_lowercase()))
    }

    /// 严重度：有关键异常 -> Critical；活动数达到阈值 -> Major；有活动 -> Minor；否则 Normal。
    pub fn severity(&self, total_active: usize, critical: usize) -> Severity {
        if critical > 0 {
            Severity::Critical
        } else if total_active >= self.major_threshold {
            Severity::Major
        } else if total_active > 0 {
            Severity::Minor
        } else {
            Severity::Normal
        }
    }

    /// 汇总多个异常寄存器。保留位即使置位也不计入活动异常。
    pub fn aggregate(&self, registers: &[(u32, u16)]) -> AlarmSummary {
        let mut decoded = Vec::with_capacity(registers.len());
        let mut active = Vec::new();
        let mut critical = Vec::new();
        let mut categories: BTreeMap<AlarmCategory, usize> =
            AlarmCategory::ALL.into_iter().map(|c| (c, 0)).collect();

        for (register, raw) in registers {
            let flags: Vec<DecodedFlag> = decode(*register, *raw).into_values().collect();
            for flag in flags.iter().filter(|flag| flag.active && !flag.reserved) {
                *categories
                    .entry(AlarmCategory::classify(&flag.name))
                    .or_insert(0) += 1;
                if self.is_critical(flag) {
                    critical.push(flag.clone());
                }
                active.push(flag.clone());
            }
            decoded.push(RegisterDecode {
                register: *register,
                raw: *raw,
                flags,
            });
        }

        AlarmSummary {
            severity: self.severity(active.len(), critical.len()),
            total_active: active.len(),
            registers: decoded,
            active,
            critical,
            categories,
        }
    }

    /// 汇总 R10001-R10005，`raws` 依寄存器顺序排列。
    pub fn aggregate_alarm_block(&self, raws: &[u16; 5]) -> AlarmSummary {
        let registers: Vec<(u32, u16)> = ALARM_REGISTERS
            .iter()
            .copied()
            .zip(raws.iter().copied())
            .collect();
        self.aggregate(&registers)
    }
}

/// 单个寄存器的解析结果。
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterDecode {
    pub register: u32,
    pub raw: u16,
    pub flags: Vec<DecodedFlag>,
}

/// 异常汇总。
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSummary {
    pub registers: Vec<RegisterDecode>,
    pub active: Vec<DecodedFlag>,
    pub critical: Vec<DecodedFlag>,
    pub total_active: usize,
    pub severity: Severity,
    pub categories: BTreeMap<AlarmCategory, usize>,
}

impl AlarmSummary {
    pub fn category_count(&self, category: AlarmCategory) -> usize {
        self.categories.get(&category).copied().unwrap_or(0)
    }
}
