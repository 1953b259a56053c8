/// 跨模块统一的错误类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AddressOutOfRange,
    ValueOutOfRange,
    BatchSizeInvalid,
    NotConnected,
    PoolExhausted,
    WriteTimeout,
    ReadTimeout,
    ReadbackMismatch,
    Unavailable,
    UnknownPoint,
    UnknownCommand,
    /// 设备返回 Modbus 异常响应
    Device,
    Internal,
}

impl ErrorKind {
    /// 本地校验错误：不重试，不触达网络。
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AddressOutOfRange | Self::ValueOutOfRange | Self::BatchSizeInvalid
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddressOutOfRange => "AddressOutOfRange",
            Self::ValueOutOfRange => "ValueOutOfRange",
            Self::BatchSizeInvalid => "BatchSizeInvalid",
            Self::NotConnected => "NotConnected",
            Self::PoolExhausted => "PoolExhausted",
            Self::WriteTimeout => "WriteTimeout",
            Self::ReadTimeout => "ReadTimeout",
            Self::ReadbackMismatch => "ReadbackMismatch",
            Self::Unavailable => "Unavailable",
            Self::UnknownPoint => "UnknownPoint",
            Self::UnknownCommand => "UnknownCommand",
            Self::Device => "Device",
            Self::Internal => "Internal",
        }
    }
}
