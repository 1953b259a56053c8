//! Modbus TCP 传输驱动
//!
//! 每个会话对应一条到 PLC 的 TCP 连接，由连接池按端点复用。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let connector = ModbusTcpConnector::new(ModbusTcpConfig::default());
//! let pool = ConnectionPool::new(Arc::new(connector), PoolConfig::default());
//! let mut lease = pool.acquire(&endpoint).await?;
//! let values = lease.read_holding_registers(0, 6).await?;
//! ```

use crate::error::ProtocolError;
use crate::transport::{RegisterSession, SessionConnector};
use crate::types::{MAX_READ_REGISTERS, MAX_WRITE_REGISTERS};
use async_trait::async_trait;
use domain::DeviceEndpoint;
use std::time::Duration;
use tokio_modbus::prelude::*;
use tracing::{debug, info};

/// Modbus TCP 连接参数
#[derive(Debug, Clone)]
pub struct ModbusTcpConfig {
    /// 建连超时（毫秒）
    pub connect_timeout_ms: u64,
}

impl Default for ModbusTcpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3000,
        }
    }
}

/// Modbus TCP 会话工厂
#[derive(Debug, Clone, Default)]
pub struct ModbusTcpConnector {
    config: ModbusTcpConfig,
}

impl ModbusTcpConnector {
    pub fn new(config: ModbusTcpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionConnector for ModbusTcpConnector {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
    ) -> Result<Box<dyn RegisterSession>, ProtocolError> {
        let address = endpoint.address();
        let socket_addr = tokio::net::lookup_host(&address)
            .await?
            .next()
            .ok_or_else(|| ProtocolError::Connection(format!("cannot resolve {}", address)))?;

        let connect = tcp::connect_slave(socket_addr, Slave(endpoint.unit_id));
        let ctx = tokio::time::timeout(
            Duration::from_millis(self.config.connect_timeout_ms),
            connect,
        )
        .await
        .map_err(|_| ProtocolError::Timeout(format!("connect to {}", address)))?
        .map_err(|e| ProtocolError::Connection(e.to_string()))?;

        info!(
            target: "plcgw.protocol",
            endpoint = %endpoint,
            "modbus_session_opened"
        );
        Ok(Box::new(ModbusTcpSession {
            endpoint: endpoint.clone(),
            ctx,
        }))
    }
}

/// 单条 Modbus TCP 会话
pub struct ModbusTcpSession {
    endpoint: DeviceEndpoint,
    ctx: tokio_modbus::client::Context,
}

#[async_trait]
impl RegisterSession for ModbusTcpSession {
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        if count == 0 || count > MAX_READ_REGISTERS {
            return Err(ProtocolError::InvalidRequest(format!(
                "read count {} outside 1..={}",
                count, MAX_READ_REGISTERS
            )));
        }
        self.ctx.set_slave(Slave(unit_id));
        let registers = self
            .ctx
            .read_holding_registers(address, count)
            .await
            .map_err(|e| ProtocolError::Connection(e.to_string()))?
            .map_err(|e| ProtocolError::Exception(format!("{:?}", e)))?;

        debug!(
            target: "plcgw.protocol",
            endpoint = %self.endpoint,
            address = address,
            count = count,
            values = ?registers,
            "read modbus registers"
        );
        if registers.len() != usize::from(count) {
            return Err(ProtocolError::Connection(format!(
                "short read: expected {} registers, got {}",
                count,
                registers.len()
            )));
        }
        Ok(registers)
    }

    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ProtocolError> {
        self.ctx.set_slave(Slave(unit_id));
        self.ctx
            .write_single_register(address, value)
            .await
            .map_err(|e| ProtocolError::Connection(e.to_string()))?
            .map_err(|e| ProtocolError::Exception(format!("{:?}", e)))?;
        debug!(
            target: "plcgw.protocol",
            endpoint = %self.endpoint,
            address = address,
            value = value,
            "wrote modbus register"
        );
        Ok(())
    }

    async fn write_multiple_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        values: &[u16],
    ) -> Result<(), ProtocolError> {
        if values.is_empty() || values.len() > usize::from(MAX_WRITE_REGISTERS) {
            return Err(ProtocolError::InvalidRequest(format!(
                "write count {} outside 1..={}",
                values.len(),
                MAX_WRITE_REGISTERS
            )));
        }
        self.ctx.set_slave(Slave(unit_id));
        self.ctx
            .write_multiple_registers(address, values)
            .await
            .map_err(|e| ProtocolError::Connection(e.to_string()))?
            .map_err(|e| ProtocolError::Exception(format!("{:?}", e)))?;
        debug!(
            target: "plcgw.protocol",
            endpoint = %self.endpoint,
            address = address,
            count = values.len(),
            "wrote modbus registers"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_connect_timeout() {
        let connector = ModbusTcpConnector::default();
        assert_eq!(connector.config.connect_timeout_ms, 3000);
    }
}
