//! 服务器模块
//!
//! 提供 MCP 服务器的实现，支持多种传输协议。

pub mod handler;
pub mod transport;

use crate::cache::Cache;
use crate::error::Result;
use crate::tools::ToolRegistry;
use rust_mcp_sdk::schema::{
    Icon, IconTheme, Implementation, InitializeResult, ProtocolVersion, ServerCapabilities,
    ServerCapabilitiesTools,
};
use std::sync::Arc;

/// 服务器配置
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ServerConfig {
    /// 服务器名称
    pub name: String,

    /// 服务器版本
    pub version: String,

    /// 服务器描述
    pub description: Option<String>,

    /// 服务器图标
    pub icons: Vec<Icon>,

    /// 网站 URL
    pub website_url: Option<String>,

    /// 主机地址
    pub host: String,

    /// 端口
    pub port: u16,

    /// 传输模式
    pub transport_mode: String,

    /// 启用 SSE 支持
    pub enable_sse: bool,

    /// 最大并发连接数
    pub max_connections: usize,

    /// 请求超时时间（秒）
    pub request_timeout_secs: u64,

    /// 响应超时时间（秒）
    pub response_timeout_secs: u64,

    /// 缓存配置
    pub cache: crate::cache::CacheConfig,

    /// 提取器配置
    pub extractor: crate::markdown::ExtractorConfig,

    /// 日志配置
    pub logging: crate::config::LoggingConfig,

    /// 性能配置
    pub performance: crate::config::PerformanceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "swift-package-docs".to_string(),
            version: crate::VERSION.to_string(),
            description: Some("高性能 Swift 包文档查询 MCP 服务器".to_string()),
            icons: vec![
                Icon {
                    src: "https://swiftpackageindex.com/favicon.ico".to_string(),
                    mime_type: Some("image/x-icon".to_string()),
                    sizes: vec!["32x32".to_string()],
                    theme: Some(IconTheme::Light),
                },
                Icon {
                    src: "https://swiftpackageindex.com/favicon.ico".to_string(),
                    mime_type: Some("image/x-icon".to_string()),
                    sizes: vec!["32x32".to_string()],
                    theme: Some(IconTheme::Dark),
                },
            ],
            website_url: Some("https://github.com/KingingWang/swift-package-docs".to_string()),
            host: "127.0.0.1".to_string(),
            port: 8080,
            transport_mode: "hybrid".to_string(),
            enable_sse: true,
            max_connections: 100,
            request_timeout_secs: 30,
            response_timeout_secs: 60,
            cache: crate::cache::CacheConfig::default(),
            extractor: crate::markdown::ExtractorConfig::default(),
            logging: crate::config::LoggingConfig::default(),
            performance: crate::config::PerformanceConfig::default(),
        }
    }
}

/// MCP 服务器
#[derive(Clone)]
pub struct SwiftPackageDocsServer {
    config: ServerConfig,
    tool_registry: Arc<ToolRegistry>,
    cache: Arc<dyn Cache>,
}

impl SwiftPackageDocsServer {
    /// 创建新的服务器实例
    ///
    /// 缓存在这里构造一次，之后通过句柄传递给各个消费者。
    pub fn new(config: ServerConfig) -> Result<Self> {
        let cache_box: Box<dyn Cache> = crate::cache::create_cache(&config.cache)?;
        let cache: Arc<dyn Cache> = Arc::from(cache_box);

        // 创建包服务
        let package_service = Arc::new(crate::tools::packages::PackageService::with_extractor(
            cache.clone(),
            config.extractor.clone(),
        ));

        // 创建工具注册器
        let tool_registry = Arc::new(crate::tools::create_default_registry(&package_service));

        Ok(Self {
            config,
            tool_registry,
            cache,
        })
    }

    /// 获取服务器配置
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 获取工具注册器
    #[must_use]
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// 获取缓存
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// 获取服务器信息
    #[must_use]
    pub fn server_info(&self) -> InitializeResult {
        InitializeResult {
            server_info: Implementation {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
                title: Some("Swift Package Docs MCP Server".to_string()),
                description: self.config.description.clone(),
                icons: self.config.icons.clone(),
                website_url: self.config.website_url.clone(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools { list_changed: None }),
                resources: None,
                prompts: None,
                experimental: None,
                completions: None,
                logging: None,
                tasks: None,
            },
            protocol_version: ProtocolVersion::V2025_11_25.into(),
            instructions: Some(
                "使用此服务器查询 Swift 包文档。支持获取 README 用法示例、查询包元数据与依赖、按关键词搜索包和健康检查。"
                    .to_string(),
            ),
            meta: None,
        }
    }

    /// 运行 Stdio 服务器
    pub async fn run_stdio(&self) -> Result<()> {
        transport::run_stdio_server(self).await
    }

    /// 运行 HTTP 服务器
    pub async fn run_http(&self) -> Result<()> {
        transport::run_http_server(self).await
    }

    /// 运行 SSE 服务器
    pub async fn run_sse(&self) -> Result<()> {
        transport::run_sse_server(self).await
    }
}
