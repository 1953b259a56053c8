//! 内存存储实现模块
//!
//! 包含以下实现：
//! - RealtimeStore: InMemoryRealtimeStore

pub mod realtime;

pub use realtime::*;
