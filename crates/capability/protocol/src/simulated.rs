//! 内存模拟 PLC
//!
//! 仅用于本地演示和测试：一组保持寄存器 + 在线/离线开关 + 会话计数。
//! 多寄存器写入在一把锁内完成，保证要么全部写入要么全部不写。

use crate::error::ProtocolError;
use crate::transport::{RegisterSession, SessionConnector};
use async_trait::async_trait;
use domain::DeviceEndpoint;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const REGISTER_SPACE: usize = u16::MAX as usize + 1;

struct PlcState {
    registers: Mutex<Vec<u16>>,
    /// 写入被设备静默忽略的地址（用于回读不一致场景）
    locked: Mutex<HashSet<u16>>,
    /// 访问时返回 Modbus 异常的地址
    faulted: Mutex<HashSet<u16>>,
    online: AtomicBool,
    latency_ms: AtomicU64,
    open_sessions: AtomicUsize,
    peak_sessions: AtomicUsize,
    connects: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// 模拟 PLC 句柄（可克隆，共享同一寄存器表）。
#[derive(Clone)]
pub struct SimulatedPlc {
    state: Arc<PlcState>,
}

impl Default for SimulatedPlc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlc {
    pub fn new() -> Self {
        Self {
            state: Arc::new(PlcState {
                registers: Mutex::new(vec![0; REGISTER_SPACE]),
                locked: Mutex::new(HashSet::new()),
                faulted: Mutex::new(HashSet::new()),
                online: AtomicBool::new(true),
                latency_ms: AtomicU64::new(0),
                open_sessions: AtomicUsize::new(0),
                peak_sessions: AtomicUsize::new(0),
                connects: AtomicU64::new(0),
                reads: AtomicU64::new(0),
                writes: AtomicU64::new(0),
            }),
        }
    }

    /// 按线路地址设置寄存器值。
    pub fn set_register(&self, address: u16, value: u16) {
        if let Ok(mut registers) = self.state.registers.lock() {
            registers[usize::from(address)] = value;
        }
    }

    pub fn register(&self, address: u16) -> u16 {
        self.state
            .registers
            .lock()
            .map(|registers| registers[usize::from(address)])
            .unwrap_or(0)
    }

    pub fn set_online(&self, online: bool) {
        self.state.online.store(online, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// 该地址的写入被设备接受但不生效。
    pub fn lock_register(&self, address: u16) {
        if let Ok(mut locked) = self.state.locked.lock() {
            locked.insert(address);
        }
    }

    /// 访问该地址时返回非法数据地址异常。
    pub fn fault_register(&self, address: u16) {
        if let Ok(mut faulted) = self.state.faulted.lock() {
            faulted.insert(address);
        }
    }

    pub fn open_sessions(&self) -> usize {
        self.state.open_sessions.load(Ordering::SeqCst)
    }

    /// 同时打开会话数的历史峰值。
    pub fn peak_sessions(&self) -> usize {
        self.state.peak_sessions.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> u64 {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> u64 {
        self.state.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.state.writes.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), ProtocolError> {
        if self.state.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProtocolError::Connection("device offline".to_string()))
        }
    }

    fn ensure_not_faulted(&self, address: u16, count: usize) -> Result<(), ProtocolError> {
        let faulted = self
            .state
            .faulted
            .lock()
            .map_err(|_| ProtocolError::Connection("lock failed".to_string()))?;
        let end = usize::from(address) + count;
        if (usize::from(address)..end).any(|addr| faulted.contains(&(addr as u16))) {
            return Err(ProtocolError::Exception("IllegalDataAddress".to_string()));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let latency_ms = self.state.latency_ms.load(Ordering::SeqCst);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }
    }

    fn open_session(&self) {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        let open = self.state.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_sessions.fetch_max(open, Ordering::SeqCst);
    }
}

/// 模拟 PLC 会话。
pub struct SimulatedSession {
    plc: SimulatedPlc,
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.plc.state.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegisterSession for SimulatedSession {
    async fn read_holding_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        self.plc.ensure_online()?;
        self.plc.simulate_latency().await;
        self.plc.ensure_online()?;
        let start = usize::from(address);
        let end = start + usize::from(count);
        if end > REGISTER_SPACE {
            return Err(ProtocolError::Exception("IllegalDataAddress".to_string()));
        }
        self.plc.ensure_not_faulted(address, usize::from(count))?;
        let registers = self
            .plc
            .state
            .registers
            .lock()
            .map_err(|_| ProtocolError::Connection("lock failed".to_string()))?;
        self.plc.state.reads.fetch_add(1, Ordering::SeqCst);
        Ok(registers[start..end].to_vec())
    }

    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ProtocolError> {
        self.write_multiple_registers(unit_id, address, &[value])
            .await
    }

    async fn write_multiple_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        values: &[u16],
    ) -> Result<(), ProtocolError> {
        self.plc.ensure_online()?;
        self.plc.simulate_latency().await;
        self.plc.ensure_online()?;
        let start = usize::from(address);
        if start + values.len() > REGISTER_SPACE {
            return Err(ProtocolError::Exception("IllegalDataAddress".to_string()));
        }
        self.plc.ensure_not_faulted(address, values.len())?;
        let locked = self
            .plc
            .state
            .locked
            .lock()
            .map_err(|_| ProtocolError::Connection("lock failed".to_string()))?
            .clone();
        let mut registers = self
            .plc
            .state
            .registers
            .lock()
            .map_err(|_| ProtocolError::Connection("lock failed".to_string()))?;
        for (index, value) in values.iter().enumerate() {
            let addr = start + index;
            if !locked.contains(&(addr as u16)) {
                registers[addr] = *value;
            }
        }
        self.plc.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 模拟 PLC 会话工厂：按端点路由到对应的模拟设备。
#[derive(Clone, Default)]
pub struct SimulatedConnector {
    devices: Arc<Mutex<HashMap<DeviceEndpoint, SimulatedPlc>>>,
}

impl SimulatedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册端点并返回其模拟设备句柄（已存在则返回原设备）。
    pub fn attach(&self, endpoint: &DeviceEndpoint) -> SimulatedPlc {
        match self.devices.lock() {
            Ok(mut devices) => devices
                .entry(endpoint.clone())
                .or_insert_with(SimulatedPlc::new)
                .clone(),
            Err(_) => SimulatedPlc::new(),
        }
    }

    pub fn device(&self, endpoint: &DeviceEndpoint) -> Option<SimulatedPlc> {
        self.devices
            .lock()
            .ok()
            .and_then(|devices| devices.get(endpoint).cloned())
    }
}

#[async_trait]
impl SessionConnector for SimulatedConnector {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
    ) -> Result<Box<dyn RegisterSession>, ProtocolError> {
        let plc = self
            .device(endpoint)
            .ok_or_else(|| ProtocolError::Connection(format!("no device at {}", endpoint)))?;
        plc.ensure_online()?;
        plc.open_session();
        Ok(Box::new(SimulatedSession { plc }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> DeviceEndpoint {
        DeviceEndpoint::new("sim", 502, 1)
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let connector = SimulatedConnector::new();
        let plc = connector.attach(&endpoint());
        let mut session = connector.connect(&endpoint()).await.expect("connect");
        session
            .write_multiple_registers(1, 502, &[100, 200, 300])
            .await
            .expect("write");
        let values = session
            .read_holding_registers(1, 502, 3)
            .await
            .expect("read");
        assert_eq!(values, vec![100, 200, 300]);
        assert_eq!(plc.register(503), 200);
    }

    #[tokio::test]
    async fn offline_device_refuses_connections() {
        let connector = SimulatedConnector::new();
        let plc = connector.attach(&endpoint());
        plc.set_online(false);
        let err = connector.connect(&endpoint()).await.err().expect("offline");
        assert!(matches!(err, ProtocolError::Connection(_)));
    }

    #[tokio::test]
    async fn faulted_write_applies_nothing() {
        let connector = SimulatedConnector::new();
        let plc = connector.attach(&endpoint());
        plc.fault_register(11);
        let mut session = connector.connect(&endpoint()).await.expect("connect");
        let err = session
            .write_multiple_registers(1, 10, &[1, 2, 3])
            .await
            .expect_err("exception");
        assert!(matches!(err, ProtocolError::Exception(_)));
        assert_eq!(plc.register(10), 0);
        assert_eq!(plc.register(12), 0);
    }

    #[tokio::test]
    async fn session_count_tracks_drops() {
        let connector = SimulatedConnector::new();
        let plc = connector.attach(&endpoint());
        let first = connector.connect(&endpoint()).await.expect("connect");
        let second = connector.connect(&endpoint()).await.expect("connect");
        assert_eq!(plc.open_sessions(), 2);
        drop(first);
        drop(second);
        assert_eq!(plc.open_sessions(), 0);
        assert_eq!(plc.peak_sessions(), 2);
    }
}
