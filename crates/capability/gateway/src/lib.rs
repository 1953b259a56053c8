//! # 网关门面
//!
//! 把连接池、地址转换、换算、位解析、写入执行器与缓存组合成对外接口：
//!
//! - 读：[`Gateway::read_point`] / [`Gateway::read_batch`]（链路断开时返回带 `stale` 的缓存）
//! - 写：[`Gateway::write_point`] / [`Gateway::write_batch`] / [`Gateway::write_value`]
//! - 命令：[`Gateway::execute_command`]
//! - 快照：[`Gateway::status_snapshot`] / [`Gateway::alarm_snapshot`] / [`Gateway::value_settings`]
//!
//! 每个端点一个守护任务（[`Gateway::start`]）：链路可用时按轮询周期批量读取刷新缓存，
//! 断开时按重连间隔探测。

mod error;
mod gateway;
mod link;
mod planner;
mod poller;
mod snapshot;

pub use error::GatewayError;
pub use gateway::{Gateway, GatewayOptions, pool_config};
pub use link::{LinkEvent, LinkMonitor, LinkState};
pub use planner::{ReadRequest, plan_reads};
pub use poller::GatewayTasks;
pub use snapshot::{AlarmSnapshot, StatusSnapshot, ValueSetting};
