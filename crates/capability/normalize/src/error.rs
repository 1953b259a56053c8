use domain::{ErrorKind, WindowKind};

/// 地址转换与换算错误（均为本地校验，不触达设备）。
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("R{r_number} is outside the {} window", window.as_str())]
    AddressOutOfRange { r_number: u32, window: WindowKind },

    #[error("{} window is not configured", .0.as_str())]
    WindowNotConfigured(WindowKind),

    #[error("batch of {count} registers at R{r_number} is invalid: {reason}")]
    BatchSizeInvalid {
        r_number: u32,
        count: usize,
        reason: String,
    },

    #[error("value {value} for R{r_number} is outside [{min}, {max}]")]
    ValueOutOfRange {
        r_number: u32,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("raw value {raw} for R{r_number} is outside [{min}, {max}]")]
    RawOutOfRange {
        r_number: u32,
        raw: u16,
        min: u16,
        max: u16,
    },

    #[error("raw value {raw} is not a defined state of R{r_number}")]
    UndefinedState { r_number: u32, raw: u16 },
}

impl NormalizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AddressOutOfRange { .. } => ErrorKind::AddressOutOfRange,
            Self::WindowNotConfigured(_) => ErrorKind::Internal,
            Self::BatchSizeInvalid { .. } => ErrorKind::BatchSizeInvalid,
            Self::ValueOutOfRange { .. }
            | Self::RawOutOfRange { .. }
            | Self::UndefinedState { .. } => ErrorKind::ValueOutOfRange,
        }
    }
}
