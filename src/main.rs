//! Swift Package Docs MCP 服务器主程序

use clap::{Parser, Subcommand};
use swift_package_docs::server::transport;
use swift_package_docs::SwiftPackageDocsServer;
use rust_mcp_sdk::schema::{Icon, IconTheme};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "swift-package-docs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "高性能 Swift 包文档查询 MCP 服务器", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// 启用调试日志
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动服务器
    Serve {
        /// 传输模式 [stdio, http, sse, hybrid]
        #[arg(short, long)]
        mode: Option<String>,

        /// 监听主机
        #[arg(long)]
        host: Option<String>,

        /// 监听端口
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 生成配置文件
    Config {
        /// 输出文件路径
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 测试工具
    Test {
        /// 要测试的工具 [get_package_readme, get_package_info, search_packages, health_check]
        #[arg(short, long, default_value = "get_package_readme")]
        tool: String,

        /// 包名、owner/repo 或 GitHub URL（用于 readme 和 info）
        #[arg(long)]
        package_name: Option<String>,

        /// 搜索查询（用于 search_packages）
        #[arg(long)]
        query: Option<String>,

        /// 平台过滤（用于 search_packages，可选）
        #[arg(long)]
        platform: Option<String>,

        /// 结果限制（用于 search_packages）
        #[arg(long, default_value = "10")]
        limit: u32,

        /// 输出格式 [json, markdown, text]
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// 检查服务器健康状态
    Health {
        /// 检查类型 [all, external, internal, swift_package_index, github]
        #[arg(short = 't', long, default_value = "all")]
        check_type: String,

        /// 详细输出
        #[arg(long)]
        verbose: bool,
    },

    /// 显示版本信息
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 注意：日志系统将在 serve_command 中初始化（使用配置文件）
    // 这里不提前初始化，以便使用配置文件中的日志设置

    match cli.command {
        Commands::Serve { mode, host, port } => {
            serve_command(&cli.config, cli.debug, mode, host, port).await?;
        }
        Commands::Config { output, force } => {
            config_command(&output, force)?;
        }
        Commands::Test {
            tool,
            package_name,
            query,
            platform,
            limit,
            format,
        } => {
            test_command(
                &tool,
                package_name.as_deref(),
                query.as_deref(),
                platform.as_deref(),
                limit,
                &format,
            )
            .await?;
        }
        Commands::Health {
            check_type,
            verbose,
        } => {
            health_command(&check_type, verbose).await?;
        }
        Commands::Version => {
            version_command();
        }
    }

    Ok(())
}

/// 启动服务器命令
async fn serve_command(
    config_path: &PathBuf,
    debug: bool,
    mode: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = load_config(config_path, host, port, mode)?;

    // 获取实际使用的传输模式（用于日志和启动）
    let transport_mode = config.transport_mode.clone();

    // 初始化日志系统（优先使用配置文件，debug 模式使用 debug 级别）
    if debug {
        // 在 debug 模式下，覆盖配置文件中的日志级别
        let mut debug_config = config.logging.clone();
        debug_config.level = "debug".to_string();
        swift_package_docs::init_logging_with_config(&debug_config)
            .map_err(|e| format!("初始化日志系统失败: {e}"))?;
    } else {
        swift_package_docs::init_logging_with_config(&config.logging)
            .map_err(|e| format!("初始化日志系统失败: {e}"))?;
    }

    tracing::info!("启动 Swift Package Docs MCP 服务器 v{}", env!("CARGO_PKG_VERSION"));

    // 创建服务器
    let server: SwiftPackageDocsServer =
        SwiftPackageDocsServer::new(config).map_err(|e| format!("创建服务器失败: {}", e))?;

    // 根据模式启动服务器
    match transport_mode.to_lowercase().as_str() {
        "stdio" => {
            tracing::info!("使用 Stdio 传输模式");
            transport::run_stdio_server(&server)
                .await
                .map_err(|e| format!("Stdio 服务器启动失败: {}", e))?;
        }
        "http" => {
            tracing::info!("使用 HTTP 传输模式，监听 {}:{}", server.config().host, server.config().port);
            transport::run_http_server(&server)
                .await
                .map_err(|e| format!("HTTP 服务器启动失败: {}", e))?;
        }
        "sse" => {
            tracing::info!("使用 SSE 传输模式，监听 {}:{}", server.config().host, server.config().port);
            transport::run_sse_server(&server)
                .await
                .map_err(|e| format!("SSE 服务器启动失败: {}", e))?;
        }
        "hybrid" => {
            tracing::info!("使用混合传输模式（HTTP + SSE），监听 {}:{}", server.config().host, server.config().port);
            transport::run_hybrid_server(&server)
                .await
                .map_err(|e| format!("混合服务器启动失败: {}", e))?;
        }
        _ => {
            return Err(format!("未知的传输模式: {}", transport_mode).into());
        }
    }

    Ok(())
}

/// 加载配置
fn load_config(
    config_path: &PathBuf,
    host: Option<String>,
    port: Option<u16>,
    mode: Option<String>,
) -> Result<swift_package_docs::ServerConfig, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        tracing::info!("从文件加载配置: {}", config_path.display());
        swift_package_docs::config::AppConfig::from_file(config_path)
            .map_err(|e| format!("加载配置文件失败: {}", e))?
    } else {
        tracing::warn!("配置文件不存在，使用默认配置: {}", config_path.display());
        swift_package_docs::config::AppConfig::default()
    };

    // 仅当命令行参数显式提供时，才覆盖配置文件
    if let Some(h) = host {
        config.server.host = h;
        tracing::info!("命令行参数覆盖 host: {}", config.server.host);
    }
    if let Some(p) = port {
        config.server.port = p;
        tracing::info!("命令行参数覆盖 port: {}", config.server.port);
    }
    if let Some(m) = mode {
        config.server.transport_mode = m;
        tracing::info!("命令行参数覆盖 transport_mode: {}", config.server.transport_mode);
    }

    // 验证配置
    config
        .validate()
        .map_err(|e| format!("配置验证失败: {}", e))?;

    // 将 config::AppConfig 转换为 server::ServerConfig（传递所有配置）
    let server_config = swift_package_docs::ServerConfig {
        name: config.server.name,
        version: config.server.version,
        description: config.server.description,
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
        host: config.server.host,
        port: config.server.port,
        transport_mode: config.server.transport_mode,
        enable_sse: config.server.enable_sse,
        max_connections: config.server.max_connections,
        request_timeout_secs: config.server.request_timeout_secs,
        response_timeout_secs: config.server.response_timeout_secs,
        cache: config.cache,
        extractor: config.extractor,
        logging: config.logging,
        performance: config.performance,
    };

    Ok(server_config)
}

/// 生成配置文件命令
fn config_command(output: &PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!("配置文件已存在: {}，使用 --force 覆盖", output.display()).into());
    }

    let config = swift_package_docs::config::AppConfig::default();
    config
        .save_to_file(output)
        .map_err(|e| format!("保存配置文件失败: {}", e))?;

    println!("配置文件已生成: {}", output.display());
    println!("请根据需要编辑配置文件。");

    Ok(())
}

/// 打印工具执行结果
fn print_tool_result(result: &rust_mcp_sdk::schema::CallToolResult) {
    println!("工具执行成功:");
    if let Some(content) = result.content.first() {
        match content {
            rust_mcp_sdk::schema::ContentBlock::TextContent(text_content) => {
                println!("{}", text_content.text);
            }
            other => {
                println!("非文本内容: {:?}", other);
            }
        }
    }
}

/// 测试工具命令
async fn test_command(
    tool: &str,
    package_name: Option<&str>,
    query: Option<&str>,
    platform: Option<&str>,
    limit: u32,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("测试工具: {}", tool);

    // 创建缓存
    let cache_config = swift_package_docs::cache::CacheConfig::default();
    let cache = swift_package_docs::cache::create_cache(&cache_config)?;
    let cache_arc: std::sync::Arc<dyn swift_package_docs::cache::Cache> =
        std::sync::Arc::from(cache);

    // 创建包服务
    let package_service = std::sync::Arc::new(
        swift_package_docs::tools::packages::PackageService::new(cache_arc),
    );

    // 创建工具注册表
    let registry = swift_package_docs::tools::create_default_registry(&package_service);

    match tool {
        "get_package_readme" => {
            if let Some(name) = package_name {
                println!("测试获取 README: {}", name);
                println!("输出格式: {}", format);

                let arguments = serde_json::json!({
                    "packageName": name,
                    "format": format
                });

                match registry.execute_tool("get_package_readme", arguments).await {
                    Ok(result) => print_tool_result(&result),
                    Err(e) => eprintln!("工具执行失败: {}", e),
                }
            } else {
                return Err("get_package_readme 需要 --package-name 参数".into());
            }
        }
        "get_package_info" => {
            if let Some(name) = package_name {
                println!("测试获取包信息: {}", name);
                println!("输出格式: {}", format);

                let arguments = serde_json::json!({
                    "packageName": name,
                    "includeDependencies": true,
                    "format": format
                });

                match registry.execute_tool("get_package_info", arguments).await {
                    Ok(result) => print_tool_result(&result),
                    Err(e) => eprintln!("工具执行失败: {}", e),
                }
            } else {
                return Err("get_package_info 需要 --package-name 参数".into());
            }
        }
        "search_packages" => {
            if let Some(q) = query {
                println!("测试搜索包: {} (限制: {})", q, limit);
                println!("输出格式: {}", format);

                let mut arguments = serde_json::json!({
                    "query": q,
                    "limit": limit,
                    "format": format
                });

                if let Some(p) = platform {
                    arguments["platform"] = serde_json::Value::String(p.to_string());
                }

                match registry.execute_tool("search_packages", arguments).await {
                    Ok(result) => print_tool_result(&result),
                    Err(e) => eprintln!("工具执行失败: {}", e),
                }
            } else {
                return Err("search_packages 需要 --query 参数".into());
            }
        }
        "health_check" => {
            println!("测试健康检查");

            let arguments = serde_json::json!({
                "checkType": "all",
                "verbose": true
            });

            match registry.execute_tool("health_check", arguments).await {
                Ok(result) => print_tool_result(&result),
                Err(e) => eprintln!("工具执行失败: {}", e),
            }
        }
        _ => {
            return Err(format!("未知的工具: {}", tool).into());
        }
    }

    println!("工具测试完成");
    Ok(())
}

/// 健康检查命令
async fn health_command(check_type: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("执行健康检查: {}", check_type);

    let registry = swift_package_docs::tools::create_default_registry(&std::sync::Arc::new(
        swift_package_docs::tools::packages::PackageService::default(),
    ));

    let arguments = serde_json::json!({
        "checkType": check_type,
        "verbose": verbose
    });

    match registry.execute_tool("health_check", arguments).await {
        Ok(result) => print_tool_result(&result),
        Err(e) => eprintln!("健康检查失败: {}", e),
    }

    Ok(())
}

/// 版本命令
fn version_command() {
    println!("Swift Package Docs MCP 服务器 v{}", env!("CARGO_PKG_VERSION"));
    println!("构建时间: {}", env!("BUILD_TIMESTAMP"));
    println!("Git 提交: {}", env!("GIT_COMMIT"));
    println!("Rust 版本: {}", env!("RUST_VERSION"));
}
