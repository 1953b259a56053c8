//! 工程量换算
//!
//! 线性点位：`engineering = (raw - raw_base) * precision`，反向换算四舍五入到最近的整数原始值。
//! 两态点位不做算术，查状态表。

use crate::error::NormalizeError;
use domain::{LinearScale, PointDescriptor, PointKind, PointReading, StatusTable, WriteValue};

pub const LABEL_BELOW_RANGE: &str = "BelowRange";
pub const LABEL_ABOVE_RANGE: &str = "AboveRange";

/// 原始值 -> 工程量。原始值超出声明范围时报错。
pub fn to_engineering(raw: u16, point: &PointDescriptor) -> Result<f64, NormalizeError> {
    match &point.kind {
        PointKind::Linear(scale) => {
            if raw < scale.raw_min || raw > scale.raw_max {
                return Err(NormalizeError::RawOutOfRange {
                    r_number: point.r_number,
                    raw,
                    min: scale.raw_min,
                    max: scale.raw_max,
                });
            }
            Ok(linear_value(raw, scale))
        }
        PointKind::TwoState(table) => {
            if table.contains(raw) {
                Ok(f64::from(raw))
            } else {
                Err(NormalizeError::UndefinedState {
                    r_number: point.r_number,
                    raw,
                })
            }
        }
    }
}

/// 工程量 -> 原始值。边界值（正好等于上下限）合法。
pub fn to_raw(value: f64, point: &PointDescriptor) -> Result<u16, NormalizeError> {
    match &point.kind {
        PointKind::Linear(scale) => linear_raw(value, point.r_number, scale),
        PointKind::TwoState(table) => state_raw(value, point.r_number, table),
    }
}

/// 写入值统一换算为原始值：原始值只校验范围，工程量走 `to_raw`。
pub fn resolve_write(value: WriteValue, point: &PointDescriptor) -> Result<u16, NormalizeError> {
    match value {
        WriteValue::Raw(raw) => {
            let (min, max) = point.raw_range();
            if raw < min || raw > max {
                return Err(NormalizeError::RawOutOfRange {
                    r_number: point.r_number,
                    raw,
                    min,
                    max,
                });
            }
            Ok(raw)
        }
        WriteValue::Engineering(value) => to_raw(value, point),
    }
}

/// 组装读取结果。超出范围的线性值不报错，工程量置空并标注范围状态。
pub fn reading(point: &PointDescriptor, raw: u16, ts_ms: i64, stale: bool) -> PointReading {
    let (engineering, label) = match &point.kind {
        PointKind::Linear(scale) => {
            if raw < scale.raw_min {
                (None, Some(LABEL_BELOW_RANGE.to_string()))
            } else if raw > scale.raw_max {
                (None, Some(LABEL_ABOVE_RANGE.to_string()))
            } else {
                (Some(linear_value(raw, scale)), None)
            }
        }
        PointKind::TwoState(table) => match table.label(raw) {
            Some(label) => (Some(f64::from(raw)), Some(label.to_string())),
            None => (None, Some(format!("Unknown({})", raw))),
        },
    };
    PointReading {
        r_number: point.r_number,
        raw,
        engineering,
        unit: point.unit.clone(),
        label,
        stale,
        ts_ms,
    }
}

fn linear_value(raw: u16, scale: &LinearScale) -> f64 {
    (i64::from(raw) - i64::from(scale.raw_base)) as f64 * scale.precision
}

fn linear_raw(value: f64, r_number: u32, scale: &LinearScale) -> Result<u16, NormalizeError> {
    let out_of_range = || NormalizeError::ValueOutOfRange {
        r_number,
        value,
        min: scale.actual_min(),
        max: scale.actual_max(),
    };
    if !value.is_finite() || scale.precision <= 0.0 {
        return Err(out_of_range());
    }
    let raw = (value / scale.precision).round() + f64::from(scale.raw_base);
    if raw < f64::from(scale.raw_min) || raw > f64::from(scale.raw_max) {
        return Err(out_of_range());
    }
    Ok(raw as u16)
}

fn state_raw(value: f64, r_number: u32, table: &StatusTable) -> Result<u16, NormalizeError> {
    let undefined = || NormalizeError::ValueOutOfRange {
        r_number,
        value,
        min: table.states.iter().map(|(raw, _)| f64::from(*raw)).fold(f64::INFINITY, f64::min),
        max: table
            .states
            .iter()
            .map(|(raw, _)| f64::from(*raw))
            .fold(f64::NEG_INFINITY, f64::max),
    };
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > f64::from(u16::MAX) {
        return Err(undefined());
    }
    let raw = value as u16;
    if table.contains(raw) {
        Ok(raw)
    } else {
        Err(undefined())
    }
}
