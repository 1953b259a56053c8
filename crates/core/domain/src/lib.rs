//! 网关领域模型：设备端点、点位描述、缓存值、命令结果、位标志。
//!
//! 本 crate 不依赖任何外部库，所有能力模块共享这些类型。

pub mod data;
pub mod error;
pub mod flags;
pub mod point;

pub use data::{CachedValue, CommandOutcome, Confirmation, PointReading, WriteValue};
pub use error::ErrorKind;
pub use flags::{BitFlagDescriptor, DecodedFlag, OverallLabel, Severity};
pub use point::{
    LinearScale, OperationClass, PointDescriptor, PointKind, StatusTable, WindowKind,
};

use std::fmt;

/// 设备端点：连接池的身份键。
///
/// 创建后不可变，多个点位可共享同一端点。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub unit_id: u8,
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16, unit_id: u8) -> Self {
        Self {
            host: host.into(),
            port,
            unit_id,
        }
    }

    /// `host:port` 形式的连接地址。
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.host, self.port, self.unit_id)
    }
}
