//! 单元测试

use std::sync::Arc;
use std::time::Duration;
use swift_package_docs::{
    cache::{create_cache, Cache, CacheConfig},
    markdown::{ExtractorConfig, UsageExtractor},
    tools::packages::{cache::PackageCaches, PackageMetadata, ParsedReadme, SearchFilters},
};

fn memory_cache(max_size_bytes: usize) -> Arc<dyn Cache> {
    let config = CacheConfig {
        cache_type: "memory".to_string(),
        max_size_bytes: Some(max_size_bytes),
        default_ttl: Some(3600),
    };
    Arc::from(create_cache(&config).expect("创建缓存失败"))
}

// ============================================================================
// 缓存核心测试
// ============================================================================

/// 测试缓存的写入后立即可读
#[tokio::test]
async fn test_cache_set_then_get() {
    let cache = memory_cache(1024 * 1024);

    cache
        .set("key".to_string(), "value".to_string(), None)
        .await;
    assert_eq!(cache.get("key").await, Some("value".to_string()));
    assert!(cache.exists("key").await);
}

/// 测试 TTL 过期后读取返回缺失
#[tokio::test]
async fn test_cache_ttl_expiry() {
    let cache = memory_cache(1024 * 1024);

    cache
        .set(
            "ephemeral".to_string(),
            "value".to_string(),
            Some(Duration::from_millis(80)),
        )
        .await;
    assert!(cache.exists("ephemeral").await);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(cache.get("ephemeral").await, None);
    assert!(!cache.exists("ephemeral").await);
}

/// 测试字节预算淘汰：最早插入的条目先不可用
#[tokio::test]
async fn test_cache_eviction_oldest_first() {
    // 每个值估算 200 字节，预算只容得下两个
    let cache = memory_cache(500);
    let value = "v".repeat(100);

    cache.set("first".to_string(), value.clone(), None).await;
    cache.set("second".to_string(), value.clone(), None).await;
    cache.set("third".to_string(), value.clone(), None).await;

    assert_eq!(cache.get("first").await, None);
    assert!(cache.get("second").await.is_some());
    assert!(cache.get("third").await.is_some());

    // 存活条目的估算总大小不超过预算
    let stats = cache.stats().await;
    assert!(stats.estimated_memory_usage <= 500);
}

/// 测试超过整个预算的单个值被直接拒绝
#[tokio::test]
async fn test_cache_oversized_value_rejected() {
    let cache = memory_cache(128);

    cache.set("huge".to_string(), "x".repeat(400), None).await;
    assert!(!cache.exists("huge").await);
}

/// 测试 clear 后 stats 归零
#[tokio::test]
async fn test_cache_clear_resets_stats() {
    let cache = memory_cache(1024 * 1024);

    cache.set("a".to_string(), "1".to_string(), None).await;
    cache.set("b".to_string(), "2".to_string(), None).await;
    cache.clear().await;

    let stats = cache.stats().await;
    assert_eq!(stats.size, 0);
    assert_eq!(stats.estimated_memory_usage, 0);
}

// ============================================================================
// 分区缓存测试
// ============================================================================

/// 测试类型化分区的往返读写
#[tokio::test]
async fn test_partition_typed_round_trip() {
    let caches = PackageCaches::new(memory_cache(1024 * 1024));

    let key = PackageCaches::repo_key("Alamofire", "Alamofire");
    let metadata = PackageMetadata {
        name: "Alamofire".to_string(),
        owner: "Alamofire".to_string(),
        repo: "Alamofire".to_string(),
        stars: Some(40000),
        ..PackageMetadata::default()
    };

    assert!(caches.metadata().get(&key).await.is_none());
    caches.metadata().set(&key, &metadata).await;

    let cached = caches.metadata().get(&key).await.expect("缓存未命中");
    assert_eq!(cached.name, "Alamofire");
    assert_eq!(cached.stars, Some(40000));
}

/// 测试不同分区对同一个原始键互不干扰
#[tokio::test]
async fn test_partition_prefixes_isolate_keys() {
    let caches = PackageCaches::new(memory_cache(1024 * 1024));
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

    assert!(caches.readme().get(&key).await.is_none());
    assert!(caches.search().get(&key).await.is_none());
    assert!(caches.metadata().get(&key).await.is_some());
}

/// 测试 README 分区存储完整的解析结果
#[tokio::test]
async fn test_partition_readme_document() {
    let caches = PackageCaches::new(memory_cache(1024 * 1024));
    let extractor = UsageExtractor::default();

    let markdown = "## Usage\n\n```swift\nlet client = Client()\nclient.run()\n```\n";
    let parsed = ParsedReadme {
        raw: markdown.to_string(),
        examples: extractor.extract_usage_examples(markdown),
        installation: extractor.extract_installation_info(markdown),
        keywords: extractor.extract_keywords(markdown),
    };

    let key = PackageCaches::repo_key("owner", "repo");
    caches.readme().set(&key, &parsed).await;

    let cached = caches.readme().get(&key).await.expect("缓存未命中");
    assert_eq!(cached.examples.len(), 1);
    assert_eq!(cached.examples[0].title, "Usage");
}

/// 测试搜索键对相同输入稳定、对不同输入不同
#[test]
fn test_search_key_determinism() {
    let filters = SearchFilters {
        platform: None,
        limit: 10,
    };

    let key_a = PackageCaches::search_key("networking", &filters);
    let key_b = PackageCaches::search_key("networking", &filters);
    assert_eq!(key_a, key_b);
    assert_eq!(key_a.len(), 16);

    let other = PackageCaches::search_key("charts", &filters);
    assert_ne!(key_a, other);
}

// ============================================================================
// 提取器测试
// ============================================================================

/// 测试标准的 Usage 章节提取
#[test]
fn test_extractor_usage_round_trip() {
    let extractor = UsageExtractor::default();
    let doc = "# MyLib\n\n## Usage\n\n```swift\nlet x = Manager()\n```\n";

    let examples = extractor.extract_usage_examples(doc);
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].title, "Usage");
    assert_eq!(examples[0].language, "swift");
    assert!(examples[0].code.contains("Manager()"));
}

/// 测试示例数量上限：15 个代码块只保留前 10 个
#[test]
fn test_extractor_caps_examples() {
    let extractor = UsageExtractor::default();
    let mut doc = String::from("## Examples\n\n");
    for i in 0..15 {
        doc.push_str(&format!("```swift\nlet item{i} = Item(index: {i})\n```\n\n"));
    }

    let examples = extractor.extract_usage_examples(&doc);
    assert_eq!(examples.len(), 10);
    assert!(examples[0].code.contains("item0"));
    assert!(examples[9].code.contains("item9"));
}

/// 测试仅含 import 的代码块被过滤
#[test]
fn test_extractor_filters_import_only() {
    let extractor = UsageExtractor::default();
    let doc = "## Usage\n\n```swift\nimport Foundation\n```\n";
    assert!(extractor.extract_usage_examples(doc).is_empty());
}

/// 测试 shell 执行记录被过滤
#[test]
fn test_extractor_filters_shell_transcript() {
    let extractor = UsageExtractor::default();
    let doc = "## Usage\n\n```\n$ swift build\nBuild complete! (2.41s)\n```\n";
    assert!(extractor.extract_usage_examples(doc).is_empty());
}

/// 测试 CocoaPods 安装行提取
#[test]
fn test_extractor_installation_cocoapods() {
    let extractor = UsageExtractor::default();
    let doc = "## Installation\n\n```ruby\npod 'Alamofire', '~> 5.0'\n```\n";

    let info = extractor.extract_installation_info(doc);
    assert!(info
        .cocoapods
        .is_some_and(|snippet| snippet.contains("pod 'Alamofire'")));
}

/// 测试无安装签名的文档返回空记录
#[test]
fn test_extractor_installation_empty() {
    let extractor = UsageExtractor::default();
    let info = extractor.extract_installation_info("# Plain\n\nnothing to install\n");
    assert!(info.is_empty());
}

/// 测试关键词结果不超过 10 个
#[test]
fn test_extractor_keyword_cap() {
    let extractor = UsageExtractor::default();
    let doc = "# Package\n\nswift ios macos tvos watchos xcode uikit swiftui foundation combine async await actor concurrency networking json rest api http extra keywords";

    let keywords = extractor.extract_keywords(doc);
    assert!(keywords.len() <= 10);
}

/// 测试提取器输出的确定性
#[test]
fn test_extractor_determinism() {
    let extractor = UsageExtractor::default();
    let doc = "## Getting Started\n\nCreate a session and attach the delegate first.\n\n```swift\nlet session = Session(delegate: self)\n```\n";

    assert_eq!(
        extractor.extract_usage_examples(doc),
        extractor.extract_usage_examples(doc)
    );
    assert_eq!(
        extractor.extract_keywords(doc),
        extractor.extract_keywords(doc)
    );
}

/// 测试词表可以通过配置扩展
#[test]
fn test_extractor_config_extends_vocabulary() {
    let mut config = ExtractorConfig::default();
    config.keyword_vocabulary.push("metal".to_string());

    let extractor = UsageExtractor::new(config);
    let keywords = extractor.extract_keywords("Rendering with Metal support");
    assert!(keywords.contains(&"metal".to_string()));
}

// ============================================================================
// 配置验证边界测试
// ============================================================================

/// 测试配置验证 - 空主机名
#[test]
fn test_config_validation_empty_host() {
    let mut config = swift_package_docs::config::AppConfig::default();
    config.server.host = String::new();
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 端口为 0
#[test]
fn test_config_validation_zero_port() {
    let mut config = swift_package_docs::config::AppConfig::default();
    config.server.port = 0;
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 无效传输模式
#[test]
fn test_config_validation_invalid_transport_mode() {
    let mut config = swift_package_docs::config::AppConfig::default();
    config.server.transport_mode = "invalid".to_string();
    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("传输模式"));
}

/// 测试配置验证 - 无效日志级别
#[test]
fn test_config_validation_invalid_log_level() {
    let mut config = swift_package_docs::config::AppConfig::default();
    config.logging.level = "invalid".to_string();
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 缓存预算为 0
#[test]
fn test_config_validation_zero_cache_budget() {
    let mut config = swift_package_docs::config::AppConfig::default();
    config.cache.max_size_bytes = Some(0);
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 示例上限为 0
#[test]
fn test_config_validation_zero_max_examples() {
    let mut config = swift_package_docs::config::AppConfig::default();
    config.extractor.max_examples = 0;
    assert!(config.validate().is_err());
}

/// 测试 CACHE_TTL / CACHE_MAX_SIZE 环境变量
#[test]
fn test_config_cache_env_overrides() {
    temp_env::with_vars(
        [
            ("CACHE_TTL", Some("900")),
            ("CACHE_MAX_SIZE", Some("52428800")),
        ],
        || {
            let config =
                swift_package_docs::config::AppConfig::from_env().expect("环境变量配置加载失败");
            assert_eq!(config.cache.default_ttl, Some(900));
            assert_eq!(config.cache.max_size_bytes, Some(52_428_800));
        },
    );
}
