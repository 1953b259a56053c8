//! 传输驱动抽象
//!
//! 网关只依赖两个能力：建立到单台设备的会话，以及在会话上执行一次
//! 连续寄存器的读或写。寄存器值在线路上为大端 u16，由驱动负责编解码。

use crate::error::ProtocolError;
use async_trait::async_trait;
use domain::DeviceEndpoint;

/// 单台设备的一条会话（同一时刻只允许一个在途请求）。
#[async_trait]
pub trait RegisterSession: Send {
    /// 功能码 03
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError>;

    /// 功能码 06
    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ProtocolError>;

    /// 功能码 16，要么全部写入，要么报错且不写入任何寄存器
    async fn write_multiple_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        values: &[u16],
    ) -> Result<(), ProtocolError>;
}

/// 会话工厂。
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
    ) -> Result<Box<dyn RegisterSession>, ProtocolError>;
}
