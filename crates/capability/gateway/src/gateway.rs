//! 网关门面
//!
//! 读取：链路 Connected 时直读设备并刷新缓存；否则（或直读失败）返回带 `stale` 标记的缓存值，
//! 没有缓存时返回 `Unavailable`。
//! 写入：必须 Connected，失败原样返回，不排队、不重试、不以缓存替代。

use crate::error::GatewayError;
use crate::link::{LinkEvent, LinkMonitor, LinkState};
use crate::planner::plan_reads;
use crate::snapshot::{AlarmSnapshot, StatusSnapshot, ValueSetting};
use domain::{
    CachedValue, CommandOutcome, DeviceEndpoint, LinearScale, OperationClass, PointDescriptor,
    PointKind, PointReading, WindowKind, WriteValue,
};
use plcgw_alarm::{ALARM_REGISTERS, AlarmPolicy, STATUS_REGISTER, summarize_status};
use plcgw_config::{GatewayConfig, ResolvedProfile};
use plcgw_control::{CommandDefinition, CommandExecutor, CommandTable, ControlError, ExecutorConfig};
use plcgw_normalize::{AddressTranslator, reading, resolve_write, to_raw};
use plcgw_protocol::{
    ConnectionPool, MAX_READ_REGISTERS, MAX_WRITE_REGISTERS, PoolConfig, PoolStats,
    ProtocolError, SessionConnector, now_epoch_ms,
};
use plcgw_storage::{InMemoryRealtimeStore, RealtimeStore};
use plcgw_telemetry::MetricsSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 网关运行参数
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub poll_interval: Duration,
    pub reconnect_interval: Duration,
    pub confirm_value_writes: bool,
    pub alarm_policy: AlarmPolicy,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            reconnect_interval: Duration::from_secs(5),
            confirm_value_writes: false,
            alarm_policy: AlarmPolicy::default(),
        }
    }
}

impl From<&GatewayConfig> for GatewayOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            reconnect_interval: Duration::from_millis(config.reconnect_interval_ms),
            confirm_value_writes: config.confirm_value_writes,
            alarm_policy: AlarmPolicy {
                major_threshold: config.alarm_major_threshold,
                ..AlarmPolicy::default()
            },
        }
    }
}

/// 由运行参数生成连接池参数。
pub fn pool_config(config: &GatewayConfig) -> PoolConfig {
    PoolConfig {
        max_connections_per_host: config.max_connections_per_host,
        acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
        io_timeout: Duration::from_millis(config.io_timeout_ms),
        idle_timeout: Duration::from_secs(config.idle_timeout_seconds),
    }
}

pub(crate) struct GatewayInner {
    pub(crate) pool: Arc<ConnectionPool>,
    pub(crate) translator: Arc<AddressTranslator>,
    pub(crate) store: Arc<dyn RealtimeStore>,
    pub(crate) executor: CommandExecutor,
    pub(crate) options: GatewayOptions,
    pub(crate) endpoints: Vec<DeviceEndpoint>,
    default_endpoint: DeviceEndpoint,
    points: Vec<PointDescriptor>,
    by_register: HashMap<(DeviceEndpoint, u32), usize>,
    by_key: HashMap<String, usize>,
    links: HashMap<DeviceEndpoint, LinkMonitor>,
    /// 探测链路时读取的线路偏移（读窗口首个寄存器）
    probe_offset: u16,
}

/// 网关门面（可克隆，内部共享）。
#[derive(Clone)]
pub struct Gateway {
    pub(crate) inner: Arc<GatewayInner>,
}

impl Gateway {
    pub fn new(
        profile: ResolvedProfile,
        pool: Arc<ConnectionPool>,
        store: Arc<dyn RealtimeStore>,
        options: GatewayOptions,
    ) -> Result<Self, GatewayError> {
        let default_endpoint = profile
            .default_endpoint()
            .cloned()
            .ok_or_else(|| GatewayError::Profile("no endpoint configured".to_string()))?;
        let translator = Arc::new(AddressTranslator::new(profile.windows));
        let read_first = translator
            .window(WindowKind::Read)
            .map(|window| window.first)
            .ok_or_else(|| GatewayError::Profile("read window missing".to_string()))?;
        let probe_offset = translator.translate(read_first, WindowKind::Read)?;

        let executor = CommandExecutor::new(
            pool.clone(),
            translator.clone(),
            store.clone(),
            Arc::new(CommandTable::new(profile.commands)),
            ExecutorConfig {
                confirm_value_writes: options.confirm_value_writes,
            },
        );

        let points = profile.points;
        let by_register = points
            .iter()
            .enumerate()
            .map(|(index, point)| ((point.endpoint.clone(), point.r_number), index))
            .collect();
        let by_key = points
            .iter()
            .enumerate()
            .map(|(index, point)| (point.key.clone(), index))
            .collect();
        let links = profile
            .endpoints
            .iter()
            .map(|endpoint| (endpoint.clone(), LinkMonitor::new(endpoint.clone())))
            .collect();

        info!(
            target: "plcgw.gateway",
            profile = %profile.name,
            endpoints = profile.endpoints.len(),
            points = points.len(),
            commands = executor.commands().len(),
            "gateway_configured"
        );

        Ok(Self {
            inner: Arc::new(GatewayInner {
                pool,
                translator,
                store,
                executor,
                options,
                endpoints: profile.endpoints,
                default_endpoint,
                points,
                by_register,
                by_key,
                links,
                probe_offset,
            }),
        })
    }

    /// 以内存缓存和给定的会话工厂装配网关。
    pub fn from_config(
        profile: ResolvedProfile,
        connector: Arc<dyn SessionConnector>,
        config: &GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let pool = Arc::new(ConnectionPool::new(connector, pool_config(config)));
        Self::new(
            profile,
            pool,
            Arc::new(InMemoryRealtimeStore::new()),
            GatewayOptions::from(config),
        )
    }

    pub fn default_endpoint(&self) -> &DeviceEndpoint {
        &self.inner.default_endpoint
    }

    pub fn endpoints(&self) -> &[DeviceEndpoint] {
        &self.inner.endpoints
    }

    pub fn points(&self) -> &[PointDescriptor] {
        &self.inner.points
    }

    pub fn point(&self, key: &str) -> Option<&PointDescriptor> {
        self.inner
            .by_key
            .get(key)
            .map(|index| &self.inner.points[*index])
    }

    pub fn commands(&self) -> Vec<CommandDefinition> {
        self.inner.executor.commands().iter().cloned().collect()
    }

    pub fn link_state(&self, endpoint: &DeviceEndpoint) -> LinkState {
        self.inner
            .links
            .get(endpoint)
            .map(LinkMonitor::state)
            .unwrap_or(LinkState::Disconnected)
    }

    pub fn pool_stats(&self, endpoint: &DeviceEndpoint) -> PoolStats {
        self.inner.pool.stats(endpoint)
    }

    /// 某端点的全部缓存值（按 R 编号升序）。
    pub async fn cached_values(
        &self,
        endpoint: &DeviceEndpoint,
    ) -> Result<Vec<CachedValue>, GatewayError> {
        Ok(self.inner.store.list_last_values(endpoint).await?)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        plcgw_telemetry::metrics().snapshot()
    }

    // ---------------------------------------------------------------
    // 读取
    // ---------------------------------------------------------------

    /// 读取默认端点上的单个 R 寄存器。
    pub async fn read_point(&self, r_number: u32) -> Result<PointReading, GatewayError> {
        let endpoint = self.inner.default_endpoint.clone();
        let mut readings = self.read_range(&endpoint, r_number, 1).await?;
        readings.pop().ok_or(GatewayError::Unavailable { r_number })
    }

    /// 按点位 key 读取（点位可绑定任意端点）。
    pub async fn read_point_by_key(&self, key: &str) -> Result<PointReading, GatewayError> {
        let point = self
            .point(key)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownPoint(key.to_string()))?;
        let mut readings = self.read_range(&point.endpoint, point.r_number, 1).await?;
        readings.pop().ok_or(GatewayError::Unavailable {
            r_number: point.r_number,
        })
    }

    /// 连续读取 `count` 个寄存器，结果按 R 编号顺序排列。
    pub async fn read_batch(
        &self,
        start_r: u32,
        count: usize,
    ) -> Result<Vec<PointReading>, GatewayError> {
        let endpoint = self.inner.default_endpoint.clone();
        self.read_range(&endpoint, start_r, count).await
    }

    async fn read_range(
        &self,
        endpoint: &DeviceEndpoint,
        start_r: u32,
        count: usize,
    ) -> Result<Vec<PointReading>, GatewayError> {
        let offset = self.inner.translator.translate_batch(
            start_r,
            count,
            WindowKind::Read,
            MAX_READ_REGISTERS,
        )?;

        if self.link_state(endpoint) == LinkState::Connected {
            // 样本时间取请求发出时刻，晚到的响应不会覆盖其间写入的值
            let ts_ms = now_epoch_ms();
            match self.read_registers(endpoint, offset, count as u16).await {
                Ok(raws) => {
                    plcgw_telemetry::record_read_ok();
                    self.cache(endpoint, start_r, &raws, ts_ms).await;
                    return Ok(raws
                        .iter()
                        .zip(start_r..)
                        .map(|(raw, r_number)| {
                            reading(&self.descriptor(endpoint, r_number), *raw, ts_ms, false)
                        })
                        .collect());
                }
                Err(err) => {
                    plcgw_telemetry::record_read_failed();
                    warn!(
                        target: "plcgw.gateway",
                        endpoint = %endpoint,
                        r_number = start_r,
                        count = count,
                        error = %err,
                        "live_read_failed"
                    );
                }
            }
        }
        self.read_cached(endpoint, start_r, count).await
    }

    async fn read_cached(
        &self,
        endpoint: &DeviceEndpoint,
        start_r: u32,
        count: usize,
    ) -> Result<Vec<PointReading>, GatewayError> {
        let mut readings = Vec::with_capacity(count);
        for r_number in start_r..start_r + count as u32 {
            let cached = self
                .inner
                .store
                .get_last_value(endpoint, r_number)
                .await?
                .ok_or(GatewayError::Unavailable { r_number })?;
            readings.push(reading(
                &self.descriptor(endpoint, r_number),
                cached.raw,
                cached.ts_ms,
                true,
            ));
        }
        plcgw_telemetry::record_read_stale();
        debug!(
            target: "plcgw.gateway",
            endpoint = %endpoint,
            r_number = start_r,
            count = count,
            "stale_read_served"
        );
        Ok(readings)
    }

    /// 取租约读取，并据结果推进链路状态。
    pub(crate) async fn read_registers(
        &self,
        endpoint: &DeviceEndpoint,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        let result = match self.inner.pool.acquire(endpoint).await {
            Ok(mut lease) => lease.read_holding_registers(offset, count).await,
            Err(err) => Err(err),
        };
        if let Some(link) = self.inner.links.get(endpoint) {
            link.observe(&result);
        }
        result
    }

    pub(crate) async fn cache(
        &self,
        endpoint: &DeviceEndpoint,
        start_r: u32,
        raws: &[u16],
        ts_ms: i64,
    ) {
        for (raw, r_number) in raws.iter().zip(start_r..) {
            let value = CachedValue {
                endpoint: endpoint.clone(),
                r_number,
                raw: *raw,
                ts_ms,
            };
            if let Err(err) = self.inner.store.upsert_last_value(&value).await {
                warn!(
                    target: "plcgw.gateway",
                    endpoint = %endpoint,
                    r_number = r_number,
                    error = %err,
                    "cache_update_failed"
                );
            }
        }
    }

    fn descriptor(&self, endpoint: &DeviceEndpoint, r_number: u32) -> PointDescriptor {
        self.configured(endpoint, r_number)
            .cloned()
            .unwrap_or_else(|| raw_point(endpoint, r_number, OperationClass::Telemetry))
    }

    fn configured(&self, endpoint: &DeviceEndpoint, r_number: u32) -> Option<&PointDescriptor> {
        self.inner
            .by_register
            .get(&(endpoint.clone(), r_number))
            .map(|index| &self.inner.points[*index])
    }

    // ---------------------------------------------------------------
    // 写入
    // ---------------------------------------------------------------

    /// 写入默认端点上的单个 R 寄存器（写窗口）。
    ///
    /// 已配置的点位按其换算写入；未配置的 R 编号按原始值写入。
    pub async fn write_point(
        &self,
        r_number: u32,
        value: WriteValue,
    ) -> Result<CommandOutcome, GatewayError> {
        let endpoint = self.inner.default_endpoint.clone();
        let point = self
            .configured(&endpoint, r_number)
            .cloned()
            .unwrap_or_else(|| raw_point(&endpoint, r_number, OperationClass::Value));
        self.inner.translator.translate(r_number, WindowKind::Write)?;
        resolve_write(value, &point)?;
        self.ensure_connected(&endpoint)?;
        let result = self.inner.executor.write_point(&point, value).await;
        self.observe_write(&endpoint, &result);
        result.map_err(GatewayError::from)
    }

    /// 数值设定：按 key 写入数值窗口中的设定点（工程量）。
    pub async fn write_value(
        &self,
        key: &str,
        engineering: f64,
    ) -> Result<CommandOutcome, GatewayError> {
        let point = self
            .point(key)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownPoint(key.to_string()))?;
        self.inner
            .translator
            .translate(point.r_number, WindowKind::Value)?;
        to_raw(engineering, &point)?;
        self.ensure_connected(&point.endpoint)?;
        let result = self.inner.executor.write_value(&point, engineering).await;
        self.observe_write(&point.endpoint, &result);
        result.map_err(GatewayError::from)
    }

    /// 连续写入多个寄存器（一次功能码 16）。
    pub async fn write_batch(
        &self,
        start_r: u32,
        values: &[u16],
    ) -> Result<CommandOutcome, GatewayError> {
        let endpoint = self.inner.default_endpoint.clone();
        self.inner.translator.translate_batch(
            start_r,
            values.len(),
            WindowKind::Write,
            MAX_WRITE_REGISTERS,
        )?;
        self.ensure_connected(&endpoint)?;
        let result = self
            .inner
            .executor
            .write_batch(&endpoint, start_r, values)
            .await;
        self.observe_write(&endpoint, &result);
        result.map_err(GatewayError::from)
    }

    /// 执行具名命令。
    pub async fn execute_command(&self, name: &str) -> Result<CommandOutcome, GatewayError> {
        let endpoint = self
            .inner
            .executor
            .commands()
            .get(name)
            .map(|command| command.endpoint.clone())
            .ok_or_else(|| ControlError::UnknownCommand(name.to_string()))?;
        self.ensure_connected(&endpoint)?;
        let result = self.inner.executor.execute(name).await;
        self.observe_write(&endpoint, &result);
        result.map_err(GatewayError::from)
    }

    fn ensure_connected(&self, endpoint: &DeviceEndpoint) -> Result<(), GatewayError> {
        match self.link_state(endpoint) {
            LinkState::Connected => Ok(()),
            state => Err(GatewayError::NotConnected {
                endpoint: endpoint.to_string(),
                state,
            }),
        }
    }

    fn observe_write<T>(&self, endpoint: &DeviceEndpoint, result: &Result<T, ControlError>) {
        let event = match result {
            Ok(_) | Err(ControlError::ReadbackMismatch { .. }) => Some(LinkEvent::IoSucceeded),
            Err(ControlError::Write { source, .. }) => LinkEvent::from_error(source),
            Err(_) => None,
        };
        if let (Some(event), Some(link)) = (event, self.inner.links.get(endpoint)) {
            link.apply(event);
        }
    }

    // ---------------------------------------------------------------
    // 快照
    // ---------------------------------------------------------------

    pub async fn status_snapshot(&self) -> Result<StatusSnapshot, GatewayError> {
        let reading = self.read_point(STATUS_REGISTER).await?;
        Ok(StatusSnapshot {
            summary: summarize_status(reading.raw),
            stale: reading.stale,
            ts_ms: reading.ts_ms,
        })
    }

    pub async fn alarm_snapshot(&self) -> Result<AlarmSnapshot, GatewayError> {
        let readings = self
            .read_batch(ALARM_REGISTERS[0], ALARM_REGISTERS.len())
            .await?;
        let mut raws = [0u16; 5];
        for (slot, reading) in raws.iter_mut().zip(&readings) {
            *slot = reading.raw;
        }
        Ok(AlarmSnapshot {
            summary: self.inner.options.alarm_policy.aggregate_alarm_block(&raws),
            stale: readings.iter().any(|reading| reading.stale),
            ts_ms: readings
                .iter()
                .map(|reading| reading.ts_ms)
                .min()
                .unwrap_or_default(),
        })
    }

    /// 所有数值设定点的当前值。
    pub async fn value_settings(&self) -> Vec<ValueSetting> {
        let points: Vec<PointDescriptor> = self
            .inner
            .points
            .iter()
            .filter(|point| point.class == OperationClass::Value)
            .cloned()
            .collect();
        let mut settings = Vec::with_capacity(points.len());
        for point in points {
            let reading = match self.read_range(&point.endpoint, point.r_number, 1).await {
                Ok(mut readings) => readings.pop(),
                Err(err) => {
                    debug!(
                        target: "plcgw.gateway",
                        key = %point.key,
                        error = %err,
                        "value_setting_unavailable"
                    );
                    None
                }
            };
            settings.push(ValueSetting { point, reading });
        }
        settings
    }

    // ---------------------------------------------------------------
    // 链路与轮询
    // ---------------------------------------------------------------

    /// 探测链路：读取读窗口首个寄存器，成功则进入 Connected。
    pub async fn probe(&self, endpoint: &DeviceEndpoint) -> LinkState {
        let Some(link) = self.inner.links.get(endpoint) else {
            return LinkState::Disconnected;
        };
        link.apply(LinkEvent::ProbeStarted);
        if let Err(err) = self
            .read_registers(endpoint, self.inner.probe_offset, 1)
            .await
        {
            warn!(
                target: "plcgw.link",
                endpoint = %endpoint,
                error = %err,
                "link_probe_failed"
            );
        }
        if link.state() == LinkState::Connecting {
            link.apply(LinkEvent::IoFailed);
        }
        link.state()
    }

    /// 依次探测所有端点。
    pub async fn connect(&self) {
        for endpoint in self.inner.endpoints.clone() {
            self.probe(&endpoint).await;
        }
    }

    /// 执行一轮轮询：读取端点上全部点位以及状态/异常寄存器并写入缓存。
    ///
    /// 返回刷新的寄存器数。任一请求失败即结束本轮。
    pub async fn poll_once(&self, endpoint: &DeviceEndpoint) -> Result<usize, GatewayError> {
        let requests = plan_reads(
            self.poll_targets(endpoint),
            &self.inner.translator,
            MAX_READ_REGISTERS,
        )?;
        let mut refreshed = 0;
        for request in &requests {
            let ts_ms = now_epoch_ms();
            let raws = self
                .read_registers(endpoint, request.offset, request.count)
                .await
                .map_err(|source| {
                    plcgw_telemetry::record_read_failed();
                    GatewayError::Read {
                        endpoint: endpoint.to_string(),
                        r_number: request.start_r,
                        source,
                    }
                })?;
            plcgw_telemetry::record_read_ok();
            self.cache(endpoint, request.start_r, &raws, ts_ms).await;
            refreshed += raws.len();
        }
        plcgw_telemetry::record_poll_cycle();
        debug!(
            target: "plcgw.poller",
            endpoint = %endpoint,
            requests = requests.len(),
            registers = refreshed,
            "poll_cycle_completed"
        );
        Ok(refreshed)
    }

    fn poll_targets(&self, endpoint: &DeviceEndpoint) -> Vec<(DeviceEndpoint, u32)> {
        let readable = |r_number: u32| {
            self.inner
                .translator
                .window(WindowKind::Read)
                .is_some_and(|window| window.contains(r_number))
        };
        let mut targets: Vec<(DeviceEndpoint, u32)> = self
            .inner
            .points
            .iter()
            .filter(|point| &point.endpoint == endpoint && readable(point.r_number))
            .map(|point| (endpoint.clone(), point.r_number))
            .collect();
        if endpoint == &self.inner.default_endpoint {
            targets.extend(
                std::iter::once(STATUS_REGISTER)
                    .chain(ALARM_REGISTERS)
                    .filter(|r_number| readable(*r_number))
                    .map(|r_number| (endpoint.clone(), r_number)),
            );
        }
        targets
    }
}

/// 未配置 R 编号的原始寄存器描述（不做换算）。
fn raw_point(endpoint: &DeviceEndpoint, r_number: u32, class: OperationClass) -> PointDescriptor {
    PointDescriptor {
        key: format!("R{}", r_number),
        r_number,
        endpoint: endpoint.clone(),
        class,
        kind: PointKind::Linear(LinearScale::identity()),
        unit: String::new(),
        description: String::new(),
    }
}
