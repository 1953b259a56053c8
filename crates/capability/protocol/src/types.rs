//! 协议相关类型与常量定义

/// 功能码 03 单次最多读取的寄存器数
pub const MAX_READ_REGISTERS: u16 = 125;

/// 功能码 16 单次最多写入的寄存器数
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// 网关使用的 Modbus 功能码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModbusFunctionCode {
    /// 读保持寄存器 (0x03)
    ReadHoldingRegisters = 3,
    /// 写单个寄存器 (0x06)
    WriteSingleRegister = 6,
    /// 写多个寄存器 (0x10)
    WriteMultipleRegisters = 16,
}

impl ModbusFunctionCode {
    /// 写入 `count` 个寄存器应使用的功能码。
    pub fn for_write(count: usize) -> Self {
        if count == 1 {
            Self::WriteSingleRegister
        } else {
            Self::WriteMultipleRegisters
        }
    }
}

/// I/O 方向（用于超时错误分类）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

/// 获取当前时间戳（毫秒）
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
