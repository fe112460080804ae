//! 包文档缓存模块
//!
//! 在共享的内存缓存上划分四个命名分区：包元数据、README 文档、
//! 搜索结果和通用分区。分区只在默认 TTL 和键前缀上有差异，
//! 字节预算由底层缓存全局共享。

use crate::cache::{Cache, CacheStats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use super::{PackageMetadata, ParsedReadme, SearchFilters, SearchResult};

/// 包元数据分区默认 TTL：1 小时
const METADATA_TTL: Duration = Duration::from_secs(3600);

/// README 分区默认 TTL：30 分钟
const README_TTL: Duration = Duration::from_secs(1800);

/// 搜索结果分区默认 TTL：30 分钟
const SEARCH_TTL: Duration = Duration::from_secs(1800);

/// 通用分区默认 TTL：1 小时
const GENERAL_TTL: Duration = Duration::from_secs(3600);

/// 类型化缓存分区
///
/// 负载类型在调用点绑定；序列化失败的值被静默跳过，
/// 反序列化失败的条目按未命中处理并删除。
pub struct CachePartition<T> {
    cache: Arc<dyn Cache>,
    prefix: &'static str,
    default_ttl: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CachePartition<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            prefix: self.prefix,
            default_ttl: self.default_ttl,
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> CachePartition<T> {
    fn new(cache: Arc<dyn Cache>, prefix: &'static str, default_ttl: Duration) -> Self {
        Self {
            cache,
            prefix,
            default_ttl,
            _marker: PhantomData,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// 获取缓存值
    pub async fn get(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let serialized = self.cache.get(&full_key).await?;
        match serde_json::from_str(&serialized) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("缓存条目反序列化失败，按未命中处理: {} ({e})", full_key);
                self.cache.delete(&full_key).await;
                None
            }
        }
    }

    /// 以分区默认 TTL 写入缓存
    pub async fn set(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// 以指定 TTL 写入缓存
    ///
    /// 写入是尽力而为的：无法序列化的值不会被存储，也不会报错。
    pub async fn set_with_ttl(&self, key: &str, value: &T, ttl: Duration) {
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::debug!("缓存值序列化失败，跳过写入: {} ({e})", self.full_key(key));
                return;
            }
        };
        self.cache.set(self.full_key(key), serialized, Some(ttl)).await;
    }

    /// 检查键是否存在
    pub async fn contains(&self, key: &str) -> bool {
        self.cache.exists(&self.full_key(key)).await
    }

    /// 删除条目，返回是否删除了内容
    pub async fn remove(&self, key: &str) -> bool {
        self.cache.delete(&self.full_key(key)).await
    }

    /// 清空本分区的全部条目
    pub async fn clear(&self) {
        self.cache.clear_prefix(self.prefix).await;
    }
}

/// 包文档缓存服务：四个命名分区
#[derive(Clone)]
pub struct PackageCaches {
    metadata: CachePartition<PackageMetadata>,
    readme: CachePartition<ParsedReadme>,
    search: CachePartition<Vec<SearchResult>>,
    general: CachePartition<serde_json::Value>,
    cache: Arc<dyn Cache>,
}

impl PackageCaches {
    /// 在共享缓存上创建分区集
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            metadata: CachePartition::new(cache.clone(), "package:", METADATA_TTL),
            readme: CachePartition::new(cache.clone(), "readme:", README_TTL),
            search: CachePartition::new(cache.clone(), "search:", SEARCH_TTL),
            general: CachePartition::new(cache.clone(), "general:", GENERAL_TTL),
            cache,
        }
    }

    /// 包元数据分区
    #[must_use]
    pub fn metadata(&self) -> &CachePartition<PackageMetadata> {
        &self.metadata
    }

    /// README 文档分区
    #[must_use]
    pub fn readme(&self) -> &CachePartition<ParsedReadme> {
        &self.readme
    }

    /// 搜索结果分区
    #[must_use]
    pub fn search(&self) -> &CachePartition<Vec<SearchResult>> {
        &self.search
    }

    /// 通用分区
    #[must_use]
    pub fn general(&self) -> &CachePartition<serde_json::Value> {
        &self.general
    }

    /// 构建仓库维度的缓存键
    #[must_use]
    pub fn repo_key(owner: &str, repo: &str) -> String {
        format!("{owner}/{repo}")
    }

    /// 构建搜索缓存键
    ///
    /// 序列化 (查询, 过滤器) 后取确定性 64 位散列，渲染为定宽
    /// 16 位十六进制令牌：相同的查询和过滤器总是命中同一个槽位。
    #[must_use]
    pub fn search_key(query: &str, filters: &SearchFilters) -> String {
        let serialized =
            serde_json::to_string(&(query, filters)).unwrap_or_else(|_| query.to_string());
        let mut hasher = DefaultHasher::new();
        serialized.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// 清空所有分区
    pub async fn clear_all(&self) {
        self.cache.clear().await;
    }

    /// 底层缓存统计信息
    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryCache;

    fn caches() -> PackageCaches {
        let cache = Arc::new(MemoryCache::new(1024 * 1024, Duration::from_secs(3600)));
        PackageCaches::new(cache)
    }

    #[tokio::test]
    async fn test_metadata_partition_round_trip() {
        let caches = caches();
        let metadata = PackageMetadata {
            name: "Alamofire".to_string(),
            owner: "Alamofire".to_string(),
            repo: "Alamofire".to_string(),
            ..PackageMetadata::default()
        };

        let key = PackageCaches::repo_key("Alamofire", "Alamofire");
        assert!(caches.metadata().get(&key).await.is_none());

        caches.metadata().set(&key, &metadata).await;
        let cached = caches.metadata().get(&key).await;
        assert_eq!(cached.map(|m| m.name), Some("Alamofire".to_string()));
    }

    #[tokio::test]
    async fn test_partitions_do_not_collide_on_same_raw_key() {
        let caches = caches();
        let key = PackageCaches::repo_key("owner", "repo");

        let metadata = PackageMetadata {
            name: "repo".to_string(),
            owner: "owner".to_string(),
            repo: "repo".to_string(),
            ..PackageMetadata::default()
        };
        caches.metadata().set(&key, &metadata).await;

        // 同一个原始键在 readme 分区中不可见
        assert!(caches.readme().get(&key).await.is_none());
        assert!(caches.metadata().get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_partition_clear_is_scoped() {
        let caches = caches();
        let key = PackageCaches::repo_key("owner", "repo");

        caches
            .metadata()
            .set(
                &key,
                &PackageMetadata {
                    name: "repo".to_string(),
                    ..PackageMetadata::default()
                },
            )
            .await;
        caches
            .general()
            .set(&key, &serde_json::json!({"cached": true}))
            .await;

        caches.metadata().clear().await;

        assert!(caches.metadata().get(&key).await.is_none());
        assert!(caches.general().get(&key).await.is_some());
    }

    #[test]
    fn test_search_key_is_fixed_width_and_stable() {
        let filters = SearchFilters {
            platform: Some("ios".to_string()),
            limit: 10,
        };
        let key1 = PackageCaches::search_key("networking", &filters);
        let key2 = PackageCaches::search_key("networking", &filters);
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 16);
        assert!(key1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_search_key_differs_across_filters() {
        let base = SearchFilters {
            platform: None,
            limit: 10,
        };
        let ios = SearchFilters {
            platform: Some("ios".to_string()),
            limit: 10,
        };
        assert_ne!(
            PackageCaches::search_key("networking", &base),
            PackageCaches::search_key("networking", &ios)
        );
        assert_ne!(
            PackageCaches::search_key("networking", &base),
            PackageCaches::search_key("charts", &base)
        );
    }
}
