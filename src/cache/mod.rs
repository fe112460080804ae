//! 缓存模块
//!
//! 提供带 TTL 过期和字节预算淘汰的内存缓存。

#[cfg(feature = "cache-memory")]
pub mod memory;

use std::time::Duration;

/// 缓存 trait
#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> Option<String>;

    /// 设置缓存值
    ///
    /// 写入是尽力而为的：超出预算或无法存储的值会被静默丢弃。
    async fn set(&self, key: String, value: String, ttl: Option<Duration>);

    /// 删除缓存值，返回是否删除了条目
    async fn delete(&self, key: &str) -> bool;

    /// 清空缓存
    async fn clear(&self);

    /// 清空指定前缀下的所有条目
    async fn clear_prefix(&self, prefix: &str);

    /// 检查键是否存在（过期条目视为不存在）
    async fn exists(&self, key: &str) -> bool;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 缓存统计信息
///
/// 从存活条目重新计算，而不是维护运行计数器。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// 当前条目数
    pub size: usize,

    /// 估算的内存占用（字节）
    pub estimated_memory_usage: usize,
}

/// 缓存配置
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CacheConfig {
    /// 缓存类型：目前仅支持 memory
    pub cache_type: String,

    /// 全局内存预算（字节），所有分区共享
    pub max_size_bytes: Option<usize>,

    /// 默认 TTL（秒）
    pub default_ttl: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: "memory".to_string(),
            max_size_bytes: Some(100 * 1024 * 1024), // 100 MiB
            default_ttl: Some(3600),                 // 1小时
        }
    }
}

/// 创建缓存实例
///
/// # Errors
///
/// 如果缓存类型不支持或配置无效，返回错误
pub fn create_cache(config: &CacheConfig) -> Result<Box<dyn Cache>, crate::error::Error> {
    match config.cache_type.as_str() {
        "memory" => {
            #[cfg(feature = "cache-memory")]
            {
                let max_size_bytes = config.max_size_bytes.unwrap_or(100 * 1024 * 1024);
                let default_ttl = Duration::from_secs(config.default_ttl.unwrap_or(3600));
                Ok(Box::new(memory::MemoryCache::new(
                    max_size_bytes,
                    default_ttl,
                )))
            }
            #[cfg(not(feature = "cache-memory"))]
            {
                Err(crate::error::Error::Config(
                    "memory cache feature is not enabled".to_string(),
                ))
            }
        }
        _ => Err(crate::error::Error::Config(format!(
            "unsupported cache type: {}",
            config.cache_type
        ))),
    }
}
