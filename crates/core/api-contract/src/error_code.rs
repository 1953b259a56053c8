use domain::ErrorKind;

/// 错误类别对应的稳定错误码。
pub fn error_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::AddressOutOfRange => "GATEWAY.ADDRESS_OUT_OF_RANGE",
        ErrorKind::ValueOutOfRange => "GATEWAY.VALUE_OUT_OF_RANGE",
        ErrorKind::BatchSizeInvalid => "GATEWAY.BATCH_SIZE_INVALID",
        ErrorKind::NotConnected => "GATEWAY.NOT_CONNECTED",
        ErrorKind::PoolExhausted => "GATEWAY.POOL_EXHAUSTED",
        ErrorKind::WriteTimeout => "GATEWAY.WRITE_TIMEOUT",
        ErrorKind::ReadTimeout => "GATEWAY.READ_TIMEOUT",
        ErrorKind::ReadbackMismatch => "GATEWAY.READBACK_MISMATCH",
        ErrorKind::Unavailable => "GATEWAY.UNAVAILABLE",
        ErrorKind::UnknownPoint => "GATEWAY.UNKNOWN_POINT",
        ErrorKind::UnknownCommand => "GATEWAY.UNKNOWN_COMMAND",
        ErrorKind::Device => "GATEWAY.DEVICE_EXCEPTION",
        ErrorKind::Internal => "INTERNAL.ERROR",
    }
}
