use domain::{CommandOutcome, ErrorKind};
use plcgw_normalize::NormalizeError;
use plcgw_protocol::{IoOp, ProtocolError};

/// 写入链路错误。
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("R{r_number} is read-only")]
    ReadOnly { r_number: u32 },

    #[error("write to R{r_number} on {endpoint} failed: {source}")]
    Write {
        endpoint: String,
        r_number: u32,
        #[source]
        source: ProtocolError,
    },

    /// 写入已被设备接受，但回读值不一致（不重试）
    #[error("readback mismatch at R{}: wrote {:?}, read {:?}", .outcome.r_number, .outcome.written, .outcome.readback)]
    ReadbackMismatch { outcome: Box<CommandOutcome> },
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Normalize(err) => err.kind(),
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Self::ReadOnly { .. } => ErrorKind::AddressOutOfRange,
            Self::Write { source, .. } => source.kind(IoOp::Write),
            Self::ReadbackMismatch { .. } => ErrorKind::ReadbackMismatch,
        }
    }

    /// 回读不一致时携带的写入结果。
    pub fn outcome(&self) -> Option<&CommandOutcome> {
        match self {
            Self::ReadbackMismatch { outcome } => Some(outcome),
            _ => None,
        }
    }
}
