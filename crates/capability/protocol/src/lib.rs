//! # 传输驱动能力模块
//!
//! 提供到 PLC 的寄存器读写能力：
//! - **Modbus TCP**：基于 tokio-modbus 的真实设备会话
//! - **模拟 PLC**：内存寄存器表，用于本地演示和测试
//! - **连接池**：按端点限制并发会话数，租约排队与超时
//!
//! ## 架构设计
//!
//! ```text
//! Gateway / CommandExecutor
//!       │
//!       ▼
//! ConnectionPool ── acquire(endpoint) ──▶ ConnectionLease
//!       │                                     │
//!       ▼                                     ▼
//! SessionConnector                      RegisterSession
//!       ├── ModbusTcpConnector              ├── ModbusTcpSession
//!       └── SimulatedConnector              └── SimulatedSession
//! ```

mod error;
mod modbus_tcp;
mod pool;
pub mod simulated;
mod transport;
mod types;

pub use error::ProtocolError;
pub use modbus_tcp::{ModbusTcpConfig, ModbusTcpConnector, ModbusTcpSession};
pub use pool::{ConnectionLease, ConnectionPool, PoolConfig, PoolStats};
pub use simulated::{SimulatedConnector, SimulatedPlc};
pub use transport::{RegisterSession, SessionConnector};
pub use types::*;
