//! 端点守护任务：链路可用时周期轮询，断开时按重连间隔探测。

use crate::gateway::Gateway;
use crate::link::LinkState;
use domain::DeviceEndpoint;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// 已启动的端点守护任务。
pub struct GatewayTasks {
    handles: Vec<JoinHandle<()>>,
}

impl GatewayTasks {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 停止所有守护任务。
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

impl Gateway {
    /// 为每个端点启动一个守护任务。
    pub fn start(&self) -> GatewayTasks {
        let handles = self
            .inner
            .endpoints
            .iter()
            .cloned()
            .map(|endpoint| {
                let gateway = self.clone();
                tokio::spawn(async move { gateway.supervise(endpoint).await })
            })
            .collect();
        GatewayTasks { handles }
    }

    async fn supervise(self, endpoint: DeviceEndpoint) {
        let poll_interval = self.inner.options.poll_interval.max(Duration::from_millis(1));
        let reconnect_interval = self.inner.options.reconnect_interval;
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_probe: Option<Instant> = None;
        info!(
            target: "plcgw.poller",
            endpoint = %endpoint,
            poll_interval_ms = poll_interval.as_millis() as u64,
            reconnect_interval_ms = reconnect_interval.as_millis() as u64,
            "poller_started"
        );

        loop {
            ticker.tick().await;
            let state = self.link_state(&endpoint);
            if state.polls() {
                if let Err(err) = self.poll_once(&endpoint).await {
                    warn!(
                        target: "plcgw.poller",
                        endpoint = %endpoint,
                        state = state.as_str(),
                        error = %err,
                        "poll_cycle_failed"
                    );
                }
                self.inner.pool.evict_idle();
            } else if state == LinkState::Disconnected {
                let due = last_probe.is_none_or(|at| at.elapsed() >= reconnect_interval);
                if due {
                    last_probe = Some(Instant::now());
                    self.probe(&endpoint).await;
                }
            }
        }
    }
}
