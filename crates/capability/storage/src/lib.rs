//! # 最后已知值缓存
//!
//! 轮询任务与 API 读取并发写入同一缓存，实现必须自带同步。
//! 条目只会被更新的样本覆盖，不会被单独删除。
//!
//! - [`traits`]：缓存接口 [`RealtimeStore`]
//! - [`in_memory`]：`RwLock<HashMap>` 内存实现

pub mod error;
pub mod in_memory;
pub mod traits;

pub use error::StorageError;
pub use in_memory::InMemoryRealtimeStore;
pub use traits::RealtimeStore;
