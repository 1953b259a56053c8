//! 最后已知值内存实现

use crate::error::StorageError;
use crate::traits::RealtimeStore;
use domain::{CachedValue, DeviceEndpoint};
use std::collections::HashMap;
use std::sync::RwLock;

type ValueKey = (DeviceEndpoint, u32);

/// 最后已知值内存存储
#[derive(Default)]
pub struct InMemoryRealtimeStore {
    last_values: RwLock<HashMap<ValueKey, CachedValue>>,
}

impl InMemoryRealtimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 缓存条目数量（用于测试）
    pub fn len(&self) -> usize {
        self.last_values.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl RealtimeStore for InMemoryRealtimeStore {
    async fn upsert_last_value(&self, value: &CachedValue) -> Result<bool, StorageError> {
        let mut values = self
            .last_values
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let key = (value.endpoint.clone(), value.r_number);
        match values.get(&key) {
            Some(existing) if existing.ts_ms > value.ts_ms => Ok(false),
            _ => {
                values.insert(key, value.clone());
                Ok(true)
            }
        }
    }

    async fn get_last_value(
        &self,
        endpoint: &DeviceEndpoint,
        r_number: u32,
    ) -> Result<Option<CachedValue>, StorageError> {
        let values = self
            .last_values
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(values.get(&(endpoint.clone(), r_number)).cloned())
    }

    async fn list_last_values(
        &self,
        endpoint: &DeviceEndpoint,
    ) -> Result<Vec<CachedValue>, StorageError> {
        let values = self
            .last_values
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<CachedValue> = values
            .values()
            .filter(|value| &value.endpoint == endpoint)
            .cloned()
            .collect();
        items.sort_by_key(|value| value.r_number);
        Ok(items)
    }
}
