//! # 规范化能力模块
//!
//! - [`AddressTranslator`]：R 编号 -> 线路偏移，按操作窗口校验
//! - [`to_engineering`] / [`to_raw`]：原始值与工程量双向换算
//! - [`reading`]：读取结果组装（含范围状态标签）

mod address;
mod error;
mod scaling;

pub use address::{AddressTranslator, RegisterWindow};
pub use error::NormalizeError;
pub use scaling::{
    LABEL_ABOVE_RANGE, LABEL_BELOW_RANGE, reading, resolve_write, to_engineering, to_raw,
};
