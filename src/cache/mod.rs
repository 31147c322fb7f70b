use anyhow::Result;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CacheConfig;

/// 缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub timestamp: u64,
    /// 缓存键的MD5哈希值
    pub key_hash: String,
}

/// 有界内存缓存
///
/// 条目数超过容量上限时淘汰最旧条目；读取时检查过期并删除。
pub struct ResultCache {
    config: CacheConfig,
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    /// 生成缓存键的MD5哈希
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// 检查缓存是否过期
    fn is_expired(&self, timestamp: u64) -> bool {
        let expire_seconds = self.config.expire_hours * 3600;
        Self::now().saturating_sub(timestamp) > expire_seconds
    }

    /// 获取缓存
    pub fn get<T>(&mut self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        if !self.config.enabled {
            return None;
        }

        let hash = Self::hash_key(key);
        let entry = self.entries.get(&hash)?;

        if self.is_expired(entry.timestamp) {
            self.entries.remove(&hash);
            self.insertion_order.retain(|k| k != &hash);
            return None;
        }

        serde_json::from_value(entry.data.clone()).ok()
    }

    /// 设置缓存，容量满时淘汰最旧条目
    pub fn set<T>(&mut self, key: &str, data: &T) -> Result<()>
    where
        T: Serialize,
    {
        if !self.config.enabled || self.config.capacity == 0 {
            return Ok(());
        }

        let hash = Self::hash_key(key);
        let entry = CacheEntry {
            data: serde_json::to_value(data)?,
            timestamp: Self::now(),
            key_hash: hash.clone(),
        };

        if self.entries.insert(hash.clone(), entry).is_none() {
            self.insertion_order.push_back(hash);
        }

        while self.entries.len() > self.config.capacity {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(capacity: usize) -> CacheConfig {
        CacheConfig {
            enabled: true,
            capacity,
            expire_hours: 1,
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = ResultCache::new(test_config(4));
        cache.set("key-a", &"value-a".to_string()).unwrap();

        let value: Option<String> = cache.get("key-a");
        assert_eq!(value, Some("value-a".to_string()));
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let mut cache = ResultCache::new(test_config(4));
        let value: Option<String> = cache.get("missing");
        assert!(value.is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = ResultCache::new(test_config(2));
        cache.set("first", &1u32).unwrap();
        cache.set("second", &2u32).unwrap();
        cache.set("third", &3u32).unwrap();

        assert_eq!(cache.len(), 2);
        // 最旧条目被淘汰
        assert_eq!(cache.get::<u32>("first"), None);
        assert_eq!(cache.get::<u32>("second"), Some(2));
        assert_eq!(cache.get::<u32>("third"), Some(3));
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let mut cache = ResultCache::new(test_config(2));
        cache.set("key", &1u32).unwrap();
        cache.set("key", &2u32).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u32>("key"), Some(2));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let mut cache = ResultCache::new(CacheConfig {
            enabled: false,
            capacity: 4,
            expire_hours: 1,
        });
        cache.set("key", &1u32).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<u32>("key"), None);
    }

    #[test]
    fn test_expired_entry_removed_on_get() {
        let mut cache = ResultCache::new(CacheConfig {
            enabled: true,
            capacity: 4,
            expire_hours: 0,
        });
        cache.set("key", &1u32).unwrap();

        // expire_hours为0时条目写入即过期
        if let Some(entry) = cache.entries.values_mut().next() {
            entry.timestamp -= 10;
        }
        assert_eq!(cache.get::<u32>("key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cache = ResultCache::new(test_config(4));
        cache.set("key", &1u32).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<u32>("key"), None);
    }

    #[test]
    fn test_hash_key_stable() {
        assert_eq!(ResultCache::hash_key("abc"), ResultCache::hash_key("abc"));
        assert_ne!(ResultCache::hash_key("abc"), ResultCache::hash_key("abd"));
    }
}
