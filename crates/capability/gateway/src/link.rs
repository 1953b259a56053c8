//! 端点链路状态机
//!
//! ```text
//! Disconnected --探测--> Connecting --成功--> Connected
//!      ^                     |                  |  I/O 失败
//!      |                     | 失败             v
//!      +---------------------+------------- Degraded --I/O 成功--> Connected
//!      +-------------------------I/O 失败-------+
//! ```
//!
//! 只有 Connected 时 API 读取走设备；轮询在 Connected 与 Degraded 时都进行。

use domain::DeviceEndpoint;
use plcgw_protocol::ProtocolError;
use std::fmt;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Degraded,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
        }
    }

    /// 轮询任务是否应当读取设备。
    pub fn polls(&self) -> bool {
        matches!(self, Self::Connected | Self::Degraded)
    }

    pub fn next(self, event: LinkEvent) -> Self {
        match (self, event) {
            (Self::Disconnected, LinkEvent::ProbeStarted) => Self::Connecting,
            (Self::Disconnected, _) => Self::Disconnected,
            (Self::Connecting, LinkEvent::IoSucceeded) => Self::Connected,
            (Self::Connecting, LinkEvent::IoFailed) => Self::Disconnected,
            (Self::Connected | Self::Degraded, LinkEvent::IoSucceeded) => Self::Connected,
            (Self::Connected, LinkEvent::IoFailed) => Self::Degraded,
            (Self::Degraded, LinkEvent::IoFailed) => Self::Disconnected,
            (state, LinkEvent::ProbeStarted) => state,
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    ProbeStarted,
    IoSucceeded,
    IoFailed,
}

impl LinkEvent {
    /// 由 I/O 错误推断链路事件。
    ///
    /// Modbus 异常响应说明设备可达；租约排队超时与本地参数错误不反映链路状况。
    pub fn from_error(err: &ProtocolError) -> Option<Self> {
        if err.poisons_session() {
            Some(Self::IoFailed)
        } else if matches!(err, ProtocolError::Exception(_)) {
            Some(Self::IoSucceeded)
        } else {
            None
        }
    }
}

/// 单端点链路状态。
pub struct LinkMonitor {
    endpoint: DeviceEndpoint,
    state: Mutex<LinkState>,
}

impl LinkMonitor {
    pub fn new(endpoint: DeviceEndpoint) -> Self {
        Self {
            endpoint,
            state: Mutex::new(LinkState::Disconnected),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(LinkState::Disconnected)
    }

    /// 应用事件并返回新状态。
    pub fn apply(&self, event: LinkEvent) -> LinkState {
        let Ok(mut state) = self.state.lock() else {
            return LinkState::Disconnected;
        };
        let from = *state;
        let to = from.next(event);
        if from != to {
            *state = to;
            plcgw_telemetry::record_link_transition();
            info!(
                target: "plcgw.link",
                endpoint = %self.endpoint,
                from = from.as_str(),
                to = to.as_str(),
                "link_state_changed"
            );
        }
        to
    }

    pub fn observe<T>(&self, result: &Result<T, ProtocolError>) {
        let event = match result {
            Ok(_) => Some(LinkEvent::IoSucceeded),
            Err(err) => LinkEvent::from_error(err),
        };
        if let Some(event) = event {
            self.apply(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrades_before_disconnecting() {
        let state = LinkState::Connected.next(LinkEvent::IoFailed);
        assert_eq!(state, LinkState::Degraded);
        assert_eq!(state.next(LinkEvent::IoSucceeded), LinkState::Connected);
        assert_eq!(state.next(LinkEvent::IoFailed), LinkState::Disconnected);
    }

    #[test]
    fn only_a_probe_leaves_disconnected() {
        let state = LinkState::Disconnected;
        assert_eq!(state.next(LinkEvent::IoSucceeded), LinkState::Disconnected);
        assert_eq!(state.next(LinkEvent::IoFailed), LinkState::Disconnected);
        let probing = state.next(LinkEvent::ProbeStarted);
        assert_eq!(probing, LinkState::Connecting);
        assert_eq!(probing.next(LinkEvent::IoSucceeded), LinkState::Connected);
        assert_eq!(probing.next(LinkEvent::IoFailed), LinkState::Disconnected);
    }

    #[test]
    fn device_exception_counts_as_reachable() {
        let err = ProtocolError::Exception("IllegalDataAddress".to_string());
        assert_eq!(LinkEvent::from_error(&err), Some(LinkEvent::IoSucceeded));
        let err = ProtocolError::PoolExhausted {
            endpoint: "plc".to_string(),
            waited_ms: 2000,
        };
        assert_eq!(LinkEvent::from_error(&err), None);
        let err = ProtocolError::Timeout("read".to_string());
        assert_eq!(LinkEvent::from_error(&err), Some(LinkEvent::IoFailed));
    }

    #[test]
    fn monitor_tracks_transitions() {
        let monitor = LinkMonitor::new(DeviceEndpoint::new("sim", 502, 1));
        assert_eq!(monitor.state(), LinkState::Disconnected);
        monitor.apply(LinkEvent::ProbeStarted);
        monitor.observe::<()>(&Ok(()));
        assert_eq!(monitor.state(), LinkState::Connected);
        monitor.observe::<()>(&Err(ProtocolError::Connection("reset".to_string())));
        assert_eq!(monitor.state(), LinkState::Degraded);
    }
}
