//! 内存缓存实现
//!
//! 带 TTL 过期和全局字节预算的键值存储。淘汰策略是
//! 最早插入优先（不是 LRU）：读取不会刷新条目的插入时间，
//! 频繁读取的旧条目仍可能先于后插入的条目被淘汰。

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 缓存条目
struct CacheEntry {
    value: String,
    inserted_at: Instant,
    ttl: Duration,
    estimated_size: usize,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// 估算序列化值的内存占用
///
/// 按 UTF-16 码元数 × 2 近似字节数。这是刻意的粗略估计，
/// 只用于约束无界增长，不要求精确。
fn estimate_size(value: &str) -> usize {
    value.encode_utf16().count() * 2
}

/// 内存缓存实现
pub struct MemoryCache {
    cache: RwLock<HashMap<String, CacheEntry>>,
    max_size_bytes: usize,
    default_ttl: Duration,
}

impl MemoryCache {
    /// 创建新的内存缓存
    #[must_use]
    pub fn new(max_size_bytes: usize, default_ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_size_bytes,
            default_ttl,
        }
    }

    /// 全局内存预算（字节）
    #[must_use]
    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    /// 淘汰最早插入的条目，返回其估算大小
    fn evict_oldest(cache: &mut HashMap<String, CacheEntry>) -> Option<usize> {
        let oldest_key = cache
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone())?;

        let removed = cache.remove(&oldest_key)?;
        tracing::debug!("缓存淘汰最早插入条目: {}", oldest_key);
        Some(removed.estimated_size)
    }
}

#[async_trait::async_trait]
impl super::Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        {
            let cache = self.cache.read();
            match cache.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // 惰性过期：条目已过期，升级为写锁并移除
        let mut cache = self.cache.write();
        if cache.get(key).is_some_and(CacheEntry::is_expired) {
            cache.remove(key);
        }
        None
    }

    async fn set(&self, key: String, value: String, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let new_size = estimate_size(&value);

        // 单个条目超过整个预算时直接拒绝写入，不报错
        if new_size > self.max_size_bytes {
            tracing::warn!(
                "缓存写入被拒绝: 条目大小 {} 字节超过预算 {} 字节 (键: {})",
                new_size,
                self.max_size_bytes,
                key
            );
            return;
        }

        // 清扫、估算、淘汰、插入在同一把写锁内完成
        let mut cache = self.cache.write();

        // 写入前清扫过期条目，把清理成本摊到写操作上
        cache.retain(|_, entry| !entry.is_expired());

        let mut total: usize = cache.values().map(|entry| entry.estimated_size).sum();
        while total + new_size > self.max_size_bytes {
            match Self::evict_oldest(&mut cache) {
                Some(freed) => total = total.saturating_sub(freed),
                None => break,
            }
        }

        cache.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
                estimated_size: new_size,
            },
        );
    }

    async fn delete(&self, key: &str) -> bool {
        let mut cache = self.cache.write();
        cache.remove(key).is_some()
    }

    async fn clear(&self) {
        let mut cache = self.cache.write();
        cache.clear();
    }

    async fn clear_prefix(&self, prefix: &str) {
        let mut cache = self.cache.write();
        cache.retain(|key, _| !key.starts_with(prefix));
    }

    async fn exists(&self, key: &str) -> bool {
        let cache = self.cache.read();
        cache.get(key).is_some_and(|entry| !entry.is_expired())
    }

    async fn stats(&self) -> super::CacheStats {
        let cache = self.cache.read();
        let mut size = 0;
        let mut estimated_memory_usage = 0;
        for entry in cache.values() {
            if !entry.is_expired() {
                size += 1;
                estimated_memory_usage += entry.estimated_size;
            }
        }
        super::CacheStats {
            size,
            estimated_memory_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use tokio::time::sleep;

    fn test_cache(max_size_bytes: usize) -> MemoryCache {
        MemoryCache::new(max_size_bytes, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_memory_cache_basic() {
        let cache = test_cache(1024 * 1024);

        // 测试设置和获取
        cache.set("key1".to_string(), "value1".to_string(), None).await;
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        // 测试删除
        assert!(cache.delete("key1").await);
        assert!(!cache.delete("key1").await);
        assert_eq!(cache.get("key1").await, None);

        // 测试清空
        cache.set("key2".to_string(), "value2".to_string(), None).await;
        cache.clear().await;
        assert_eq!(cache.get("key2").await, None);
    }

    #[tokio::test]
    async fn test_memory_cache_ttl() {
        let cache = test_cache(1024 * 1024);

        // 测试带 TTL 的缓存
        cache
            .set(
                "key1".to_string(),
                "value1".to_string(),
                Some(Duration::from_millis(100)),
            )
            .await;

        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
        assert!(cache.exists("key1").await);

        // 等待过期
        sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("key1").await, None);
        assert!(!cache.exists("key1").await);
    }

    #[tokio::test]
    async fn test_memory_cache_byte_budget_eviction() {
        // 预算允许两个 100 字节的值，第三个触发淘汰
        let cache = test_cache(500);

        let value = "x".repeat(100); // 估算 200 字节
        cache.set("key1".to_string(), value.clone(), None).await;
        cache.set("key2".to_string(), value.clone(), None).await;
        cache.set("key3".to_string(), value.clone(), None).await;

        // 最早插入的 key1 被淘汰
        assert_eq!(cache.get("key1").await, None);
        assert_eq!(cache.get("key2").await, Some(value.clone()));
        assert_eq!(cache.get("key3").await, Some(value));

        let stats = cache.stats().await;
        assert_eq!(stats.size, 2);
        assert!(stats.estimated_memory_usage <= 500);
    }

    #[tokio::test]
    async fn test_memory_cache_eviction_ignores_read_recency() {
        let cache = test_cache(500);
        let value = "x".repeat(100);

        cache.set("old".to_string(), value.clone(), None).await;
        cache.set("mid".to_string(), value.clone(), None).await;

        // 读取 old 不会让它在淘汰顺序上变年轻
        assert!(cache.get("old").await.is_some());
        cache.set("new".to_string(), value, None).await;

        assert_eq!(cache.get("old").await, None);
        assert!(cache.get("mid").await.is_some());
        assert!(cache.get("new").await.is_some());
    }

    #[tokio::test]
    async fn test_memory_cache_rejects_oversized_value() {
        let cache = test_cache(100);

        // 估算 400 字节，超过整个预算，写入被拒绝
        cache.set("big".to_string(), "x".repeat(200), None).await;
        assert!(!cache.exists("big").await);
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_memory_cache_clear_prefix() {
        let cache = test_cache(1024 * 1024);

        cache.set("readme:a".to_string(), "1".to_string(), None).await;
        cache.set("readme:b".to_string(), "2".to_string(), None).await;
        cache.set("package:a".to_string(), "3".to_string(), None).await;

        cache.clear_prefix("readme:").await;

        assert_eq!(cache.get("readme:a").await, None);
        assert_eq!(cache.get("readme:b").await, None);
        assert_eq!(cache.get("package:a").await, Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_memory_cache_stats_after_clear() {
        let cache = test_cache(1024 * 1024);

        cache.set("key1".to_string(), "value1".to_string(), None).await;
        cache.set("key2".to_string(), "value2".to_string(), None).await;
        assert_eq!(cache.stats().await.size, 2);

        cache.clear().await;
        let stats = cache.stats().await;
        assert_eq!(stats.size, 0);
        assert_eq!(stats.estimated_memory_usage, 0);
    }
}
