//! # 位标志解析能力模块
//!
//! 按静态表把寄存器的 16 个位解析为具名标志，并汇总：
//! - 状态寄存器 R10000：整体标签（异常 / 未上电 / 待机 / 运转 / 上电空闲）
//! - 异常寄存器 R10001-R10005：活动异常、关键异常、严重度与分类计数

mod decode;
mod summary;
pub mod tables;

pub use decode::decode;
pub use summary::{
    AlarmCategory, AlarmPolicy, AlarmSummary, RegisterDecode, StatusSummary, overall_label,
    summarize_status,
};
pub use tables::{ALARM_REGISTERS, STATUS_REGISTER};
