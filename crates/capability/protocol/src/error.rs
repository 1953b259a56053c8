//! 协议错误类型定义

use crate::types::IoOp;
use domain::ErrorKind;

/// 传输驱动与连接池错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误（建连失败、设备离线、会话断开）
    #[error("connection error: {0}")]
    Connection(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 异常响应（会话本身仍可用）
    #[error("modbus exception: {0}")]
    Exception(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),

    /// 等待租约超时
    #[error("pool exhausted for {endpoint} after {waited_ms} ms")]
    PoolExhausted { endpoint: String, waited_ms: u64 },

    /// 请求参数不符合协议约束
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProtocolError {
    /// 发生该错误后会话是否不可再复用。
    pub fn poisons_session(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Io(_) | Self::Timeout(_))
    }

    /// 按读/写方向映射到统一错误类别。
    pub fn kind(&self, op: IoOp) -> ErrorKind {
        match self {
            Self::Connection(_) | Self::Io(_) => ErrorKind::NotConnected,
            Self::Exception(_) => ErrorKind::Device,
            Self::Timeout(_) => match op {
                IoOp::Read => ErrorKind::ReadTimeout,
                IoOp::Write => ErrorKind::WriteTimeout,
            },
            Self::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            Self::InvalidRequest(_) => ErrorKind::Internal,
        }
    }
}
