//! 追踪与操作 ID 生成，以及网关运行计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub reads_ok: u64,
    pub reads_failed: u64,
    pub reads_stale: u64,
    pub writes_ok: u64,
    pub writes_failed: u64,
    pub readback_mismatch: u64,
    pub commands_executed: u64,
    pub pool_waits: u64,
    pub pool_exhausted: u64,
    pub sessions_opened: u64,
    pub sessions_discarded: u64,
    pub poll_cycles: u64,
    pub link_transitions: u64,
    pub io_latency_ms_total: u64,
    pub io_latency_ms_count: u64,
}

impl MetricsSnapshot {
    /// 平均 I/O 耗时（毫秒），无样本时为 0。
    pub fn avg_io_latency_ms(&self) -> u64 {
        if self.io_latency_ms_count == 0 {
            0
        } else {
            self.io_latency_ms_total / self.io_latency_ms_count
        }
    }
}

/// 网关计数器。
pub struct TelemetryMetrics {
    reads_ok: AtomicU64,
    reads_failed: AtomicU64,
    reads_stale: AtomicU64,
    writes_ok: AtomicU64,
    writes_failed: AtomicU64,
    readback_mismatch: AtomicU64,
    commands_executed: AtomicU64,
    pool_waits: AtomicU64,
    pool_exhausted: AtomicU64,
    sessions_opened: AtomicU64,
    sessions_discarded: AtomicU64,
    poll_cycles: AtomicU64,
    link_transitions: AtomicU64,
    io_latency_ms_total: AtomicU64,
    io_latency_ms_count: AtomicU64,
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            reads_ok: AtomicU64::new(0),
            reads_failed: AtomicU64::new(0),
            reads_stale: AtomicU64::new(0),
            writes_ok: AtomicU64::new(0),
            writes_failed: AtomicU64::new(0),
            readback_mismatch: AtomicU64::new(0),
            commands_executed: AtomicU64::new(0),
            pool_waits: AtomicU64::new(0),
            pool_exhausted: AtomicU64::new(0),
            sessions_opened: AtomicU64::new(0),
            sessions_discarded: AtomicU64::new(0),
            poll_cycles: AtomicU64::new(0),
            link_transitions: AtomicU64::new(0),
            io_latency_ms_total: AtomicU64::new(0),
            io_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads_ok: self.reads_ok.load(Ordering::Relaxed),
            reads_failed: self.reads_failed.load(Ordering::Relaxed),
            reads_stale: self.reads_stale.load(Ordering::Relaxed),
            writes_ok: self.writes_ok.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
            readback_mismatch: self.readback_mismatch.load(Ordering::Relaxed),
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            pool_waits: self.pool_waits.load(Ordering::Relaxed),
            pool_exhausted: self.pool_exhausted.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_discarded: self.sessions_discarded.load(Ordering::Relaxed),
            poll_cycles: self.poll_cycles.load(Ordering::Relaxed),
            link_transitions: self.link_transitions.load(Ordering::Relaxed),
            io_latency_ms_total: self.io_latency_ms_total.load(Ordering::Relaxed),
            io_latency_ms_count: self.io_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 operation_id（读写命令的日志关联标识）。
pub fn new_operation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录实时读取成功次数。
pub fn record_read_ok() {
    metrics().reads_ok.fetch_add(1, Ordering::Relaxed);
}

/// 记录读取失败次数。
pub fn record_read_failed() {
    metrics().reads_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录以缓存值（stale）应答的次数。
pub fn record_read_stale() {
    metrics().reads_stale.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入成功次数。
pub fn record_write_ok() {
    metrics().writes_ok.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入失败次数。
pub fn record_write_failed() {
    metrics().writes_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录回读不一致次数。
pub fn record_readback_mismatch() {
    metrics().readback_mismatch.fetch_add(1, Ordering::Relaxed);
}

pub fn record_command_executed() {
    metrics().commands_executed.fetch_add(1, Ordering::Relaxed);
}

/// 记录租约排队次数（上限已满，需要等待）。
pub fn record_pool_wait() {
    metrics().pool_waits.fetch_add(1, Ordering::Relaxed);
}

/// 记录租约等待超时次数。
pub fn record_pool_exhausted() {
    metrics().pool_exhausted.fetch_add(1, Ordering::Relaxed);
}

pub fn record_session_opened() {
    metrics().sessions_opened.fetch_add(1, Ordering::Relaxed);
}

/// 记录因 I/O 错误被丢弃的会话数。
pub fn record_session_discarded() {
    metrics().sessions_discarded.fetch_add(1, Ordering::Relaxed);
}

pub fn record_poll_cycle() {
    metrics().poll_cycles.fetch_add(1, Ordering::Relaxed);
}

/// 记录链路状态切换次数。
pub fn record_link_transition() {
    metrics().link_transitions.fetch_add(1, Ordering::Relaxed);
}

/// 记录单次设备 I/O 耗时（毫秒）。
pub fn record_io_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .io_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics.io_latency_ms_count.fetch_add(1, Ordering::Relaxed);
}
