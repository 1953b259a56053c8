//! 网关错误类型定义

use crate::link::LinkState;
use domain::ErrorKind;
use plcgw_control::ControlError;
use plcgw_normalize::NormalizeError;
use plcgw_protocol::{IoOp, ProtocolError};
use plcgw_storage::StorageError;

/// 网关门面错误。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("unknown point: {0}")]
    UnknownPoint(String),

    /// 设备不可读且没有缓存值
    #[error("no value available for R{r_number}")]
    Unavailable { r_number: u32 },

    /// 写入要求链路处于 Connected
    #[error("{endpoint} is {state}")]
    NotConnected { endpoint: String, state: LinkState },

    #[error("read of R{r_number} on {endpoint} failed: {source}")]
    Read {
        endpoint: String,
        r_number: u32,
        #[source]
        source: ProtocolError,
    },

    #[error("cache error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid profile: {0}")]
    Profile(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Normalize(err) => err.kind(),
            Self::Control(err) => err.kind(),
            Self::UnknownPoint(_) => ErrorKind::UnknownPoint,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::NotConnected { .. } => ErrorKind::NotConnected,
            Self::Read { source, .. } => source.kind(IoOp::Read),
            Self::Storage(_) | Self::Profile(_) => ErrorKind::Internal,
        }
    }
}
