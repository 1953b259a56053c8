//! 按端点限流的连接池
//!
//! 每个 `DeviceEndpoint` 同时在外的租约数不超过 `max_connections_per_host`，
//! 超出的请求按到达顺序排队（tokio 的 `Semaphore` 为 FIFO），
//! 等待超过 `acquire_timeout` 返回 `PoolExhausted`。
//!
//! 租约在首次 I/O 时才建立会话；租约释放时会话回到空闲列表，
//! 发生连接类错误的会话直接丢弃，下一次租约重新建连。

use crate::error::ProtocolError;
use crate::transport::{RegisterSession, SessionConnector};
use domain::DeviceEndpoint;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// 连接池参数
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// 单端点最大并发租约数
    pub max_connections_per_host: usize,
    /// 等待租约的最长时间
    pub acquire_timeout: Duration,
    /// 单次读写的超时
    pub io_timeout: Duration,
    /// 空闲会话保留时长
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections_per_host: 3,
            acquire_timeout: Duration::from_millis(2000),
            io_timeout: Duration::from_millis(3000),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// 单端点的池状态快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 当前在外的租约数
    pub outstanding: usize,
    /// 空闲会话数
    pub idle: usize,
    /// 累计建立的会话数
    pub created: u64,
    /// 累计因错误丢弃的会话数
    pub discarded: u64,
    /// 在外租约数的历史峰值
    pub high_water: usize,
}

struct IdleSession {
    session: Box<dyn RegisterSession>,
    last_used: Instant,
}

struct EndpointSlot {
    endpoint: DeviceEndpoint,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<IdleSession>>,
    outstanding: AtomicUsize,
    high_water: AtomicUsize,
    created: AtomicU64,
    discarded: AtomicU64,
}

impl EndpointSlot {
    fn new(endpoint: DeviceEndpoint, max_connections: usize) -> Self {
        Self {
            endpoint,
            permits: Arc::new(Semaphore::new(max_connections)),
            idle: Mutex::new(Vec::new()),
            outstanding: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            created: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// 取出一个未过期的空闲会话，顺带清理已过期的。
    fn take_idle(&self, idle_timeout: Duration) -> Option<Box<dyn RegisterSession>> {
        let mut idle = self.idle.lock().ok()?;
        let before = idle.len();
        idle.retain(|entry| entry.last_used.elapsed() < idle_timeout);
        let expired = before - idle.len();
        if expired > 0 {
            debug!(
                target: "plcgw.pool",
                endpoint = %self.endpoint,
                expired = expired,
                "idle_sessions_evicted"
            );
        }
        idle.pop().map(|entry| entry.session)
    }

    fn give_back(&self, session: Box<dyn RegisterSession>) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(IdleSession {
                session,
                last_used: Instant::now(),
            });
        }
    }

    fn evict_expired(&self, idle_timeout: Duration) -> usize {
        match self.idle.lock() {
            Ok(mut idle) => {
                let before = idle.len();
                idle.retain(|entry| entry.last_used.elapsed() < idle_timeout);
                before - idle.len()
            }
            Err(_) => 0,
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            outstanding: self.outstanding.load(Ordering::SeqCst),
            idle: self.idle.lock().map(|idle| idle.len()).unwrap_or(0),
            created: self.created.load(Ordering::SeqCst),
            discarded: self.discarded.load(Ordering::SeqCst),
            high_water: self.high_water.load(Ordering::SeqCst),
        }
    }
}

/// 连接池
pub struct ConnectionPool {
    connector: Arc<dyn SessionConnector>,
    config: PoolConfig,
    slots: Mutex<HashMap<DeviceEndpoint, Arc<EndpointSlot>>>,
}

impl ConnectionPool {
    pub fn new(connector: Arc<dyn SessionConnector>, config: PoolConfig) -> Self {
        Self {
            connector,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn slot(&self, endpoint: &DeviceEndpoint) -> Result<Arc<EndpointSlot>, ProtocolError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| ProtocolError::Connection("pool lock poisoned".to_string()))?;
        let max = self.config.max_connections_per_host.max(1);
        Ok(slots
            .entry(endpoint.clone())
            .or_insert_with(|| Arc::new(EndpointSlot::new(endpoint.clone(), max)))
            .clone())
    }

    /// 获取租约。不做任何设备 I/O。
    pub async fn acquire(&self, endpoint: &DeviceEndpoint) -> Result<ConnectionLease, ProtocolError> {
        let slot = self.slot(endpoint)?;
        let started = Instant::now();
        let permit = match slot.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                plcgw_telemetry::record_pool_wait();
                debug!(target: "plcgw.pool", endpoint = %endpoint, "lease_queued");
                match tokio::time::timeout(
                    self.config.acquire_timeout,
                    slot.permits.clone().acquire_owned(),
                )
                .await
                {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => {
                        return Err(ProtocolError::Connection("pool closed".to_string()));
                    }
                    Err(_) => {
                        let waited_ms = started.elapsed().as_millis() as u64;
                        plcgw_telemetry::record_pool_exhausted();
                        warn!(
                            target: "plcgw.pool",
                            endpoint = %endpoint,
                            waited_ms = waited_ms,
                            "lease_wait_timeout"
                        );
                        return Err(ProtocolError::PoolExhausted {
                            endpoint: endpoint.to_string(),
                            waited_ms,
                        });
                    }
                }
            }
        };

        let outstanding = slot.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        slot.high_water.fetch_max(outstanding, Ordering::SeqCst);
        let session = slot.take_idle(self.config.idle_timeout);
        debug!(
            target: "plcgw.pool",
            endpoint = %endpoint,
            outstanding = outstanding,
            reused = session.is_some(),
            "lease_acquired"
        );

        Ok(ConnectionLease {
            slot,
            connector: self.connector.clone(),
            session,
            in_flight: false,
            io_timeout: self.config.io_timeout,
            idle_timeout: self.config.idle_timeout,
            _permit: permit,
        })
    }

    /// 单端点的池状态。未使用过的端点返回全零。
    pub fn stats(&self, endpoint: &DeviceEndpoint) -> PoolStats {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(endpoint).map(|slot| slot.stats()))
            .unwrap_or_default()
    }

    /// 关闭所有空闲超时的会话，返回关闭数量。
    pub fn evict_idle(&self) -> usize {
        let slots: Vec<Arc<EndpointSlot>> = match self.slots.lock() {
            Ok(slots) => slots.values().cloned().collect(),
            Err(_) => return 0,
        };
        let evicted: usize = slots
            .iter()
            .map(|slot| slot.evict_expired(self.config.idle_timeout))
            .sum();
        if evicted > 0 {
            debug!(target: "plcgw.pool", evicted = evicted, "idle_sessions_evicted");
        }
        evicted
    }
}

/// 连接租约：持有期间独占一条会话，释放时归还。
///
/// 每次 I/O 期间会话从租约中取出，调用方在请求未完成时放弃租约（外层超时、任务被中止）
/// 会话随之丢弃，不回到空闲列表。
pub struct ConnectionLease {
    slot: Arc<EndpointSlot>,
    connector: Arc<dyn SessionConnector>,
    session: Option<Box<dyn RegisterSession>>,
    /// 会话已取出执行请求，尚未结算
    in_flight: bool,
    io_timeout: Duration,
    idle_timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl ConnectionLease {
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.slot.endpoint
    }

    /// 取出会话用于一次请求，没有可复用会话时建立新会话。
    async fn checkout(&mut self) -> Result<Box<dyn RegisterSession>, ProtocolError> {
        if let Some(session) = self.session.take() {
            return Ok(session);
        }
        if let Some(session) = self.slot.take_idle(self.idle_timeout) {
            return Ok(session);
        }
        let session = tokio::time::timeout(
            self.io_timeout,
            self.connector.connect(&self.slot.endpoint),
        )
        .await
        .map_err(|_| ProtocolError::Timeout(format!("connect to {}", self.slot.endpoint)))??;
        self.slot.created.fetch_add(1, Ordering::SeqCst);
        plcgw_telemetry::record_session_opened();
        Ok(session)
    }

    fn discard(&self, reason: &dyn std::fmt::Display) {
        self.slot.discarded.fetch_add(1, Ordering::SeqCst);
        plcgw_telemetry::record_session_discarded();
        warn!(
            target: "plcgw.pool",
            endpoint = %self.slot.endpoint,
            error = %reason,
            "session_discarded"
        );
    }

    /// 请求结束：会话可用则放回租约，出错损坏则丢弃。
    fn settle<T>(
        &mut self,
        session: Box<dyn RegisterSession>,
        result: Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        self.in_flight = false;
        match &result {
            Err(err) if err.poisons_session() => {
                drop(session);
                self.discard(err);
            }
            _ => self.session = Some(session),
        }
        result
    }

    async fn timed<T, F>(io_timeout: Duration, what: &str, fut: F) -> Result<T, ProtocolError>
    where
        F: Future<Output = Result<T, ProtocolError>>,
    {
        let started = Instant::now();
        let result = tokio::time::timeout(io_timeout, fut)
            .await
            .map_err(|_| ProtocolError::Timeout(what.to_string()))?;
        plcgw_telemetry::record_io_latency_ms(started.elapsed().as_millis() as u64);
        result
    }

    /// 功能码 03 读取连续保持寄存器。
    pub async fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        let unit_id = self.slot.endpoint.unit_id;
        let mut session = self.checkout().await?;
        self.in_flight = true;
        let result = Self::timed(
            self.io_timeout,
            "read holding registers",
            session.read_holding_registers(unit_id, address, count),
        )
        .await;
        self.settle(session, result)
    }

    /// 功能码 06 写入单个寄存器。
    pub async fn write_single_register(
        &mut self,
        address: u16,
        value: u16,
    ) -> Result<(), ProtocolError> {
        let unit_id = self.slot.endpoint.unit_id;
        let mut session = self.checkout().await?;
        self.in_flight = true;
        let result = Self::timed(
            self.io_timeout,
            "write single register",
            session.write_single_register(unit_id, address, value),
        )
        .await;
        self.settle(session, result)
    }

    /// 功能码 16 写入连续寄存器。
    pub async fn write_multiple_registers(
        &mut self,
        address: u16,
        values: &[u16],
    ) -> Result<(), ProtocolError> {
        let unit_id = self.slot.endpoint.unit_id;
        let mut session = self.checkout().await?;
        self.in_flight = true;
        let result = Self::timed(
            self.io_timeout,
            "write multiple registers",
            session.write_multiple_registers(unit_id, address, values),
        )
        .await;
        self.settle(session, result)
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if self.in_flight {
            // 请求被放弃，会话已随请求 future 一起释放
            self.discard(&"request abandoned before completion");
        } else if let Some(session) = self.session.take() {
            self.slot.give_back(session);
        }
        self.slot.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections_per_host, 3);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
    }
}
