//! 缓存接口定义

use crate::error::StorageError;
use async_trait::async_trait;
use domain::{CachedValue, DeviceEndpoint};

/// 最后已知值缓存。
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// 写入一条样本。已有更新（`ts_ms` 更大）的样本时不覆盖，返回 `false`。
    async fn upsert_last_value(&self, value: &CachedValue) -> Result<bool, StorageError>;

    async fn get_last_value(
        &self,
        endpoint: &DeviceEndpoint,
        r_number: u32,
    ) -> Result<Option<CachedValue>, StorageError>;

    /// 按 R 编号升序列出某端点的全部缓存值。
    async fn list_last_values(
        &self,
        endpoint: &DeviceEndpoint,
    ) -> Result<Vec<CachedValue>, StorageError>;
}
