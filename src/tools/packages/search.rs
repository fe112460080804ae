//! 搜索包工具
#![allow(missing_docs)]

use crate::tools::packages::cache::PackageCaches;
use crate::tools::packages::{PackageService, SearchFilters, SearchResult};
use crate::tools::Tool;
use crate::utils::{string, validation};
use async_trait::async_trait;
use rust_mcp_sdk::macros;
use rust_mcp_sdk::schema::CallToolError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 搜索包的工具参数
#[macros::mcp_tool(
    name = "search_packages",
    title = "搜索 Swift 包",
    description = "从 Swift Package Index 按关键词搜索 Swift 包。返回匹配的包列表，包括名称、描述、Star 数等信息。适用于发现和比较可用的 Swift 库。",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional"),
    icons = [
        (src = "https://swiftpackageindex.com/favicon.ico", mime_type = "image/x-icon", sizes = ["32x32"], theme = "light"),
        (src = "https://swiftpackageindex.com/favicon.ico", mime_type = "image/x-icon", sizes = ["32x32"], theme = "dark")
    ]
)]
#[derive(Debug, Clone, Deserialize, Serialize, macros::JsonSchema)]
pub struct SearchPackagesTool {
    /// 搜索查询
    #[json_schema(
        title = "搜索查询",
        description = "搜索关键词，例如：networking、charts、json parser、websocket"
    )]
    pub query: String,

    /// 结果数量限制
    #[json_schema(
        title = "结果限制",
        description = "返回的最大结果数量，范围 1-100",
        minimum = 1,
        maximum = 100,
        default = 10
    )]
    pub limit: Option<u32>,

    /// 平台过滤
    #[json_schema(
        title = "平台过滤",
        description = "按平台过滤结果，例如 ios、macos、linux（可选）"
    )]
    pub platform: Option<String>,

    /// 输出格式
    #[json_schema(
        title = "输出格式",
        description = "搜索结果输出格式：markdown（默认）、text（纯文本）、json（原始 JSON）",
        default = "markdown"
    )]
    pub format: Option<String>,
}

/// 搜索包工具实现
pub struct SearchPackagesToolImpl {
    service: Arc<PackageService>,
}

impl SearchPackagesToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PackageService>) -> Self {
        Self { service }
    }

    /// 搜索包
    async fn search_packages(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> std::result::Result<Vec<SearchResult>, CallToolError> {
        // (查询, 过滤器) 的散列作为缓存键
        let cache_key = PackageCaches::search_key(query, filters);

        if let Some(cached) = self.service.caches().search().get(&cache_key).await {
            return Ok(cached);
        }

        let _permit = self
            .service
            .rate_limiter()
            .acquire()
            .await
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        // 平台过滤通过 Swift Package Index 的搜索限定词表达
        let effective_query = match &filters.platform {
            Some(platform) => format!("{query} platform:{platform}"),
            None => query.to_string(),
        };

        let url = format!(
            "https://swiftpackageindex.com/api/search?query={}",
            urlencoding::encode(&effective_query)
        );

        let response = self
            .service
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| CallToolError::from_message(format!("HTTP 请求失败: {e}")))?;

        if !response.status().is_success() {
            return Err(CallToolError::from_message(format!(
                "搜索失败，状态码: {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallToolError::from_message(format!("JSON 解析失败: {e}")))?;

        let results = parse_search_response(&json, filters.limit as usize);

        self.service
            .caches()
            .search()
            .set(&cache_key, &results)
            .await;

        Ok(results)
    }
}

/// 解析 Swift Package Index 搜索响应
///
/// 结果数组混合了包条目和作者条目，只保留包条目。
fn parse_search_response(json: &serde_json::Value, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(items) = json.get("results").and_then(|r| r.as_array()) {
        for item in items {
            let package = item.get("package").unwrap_or(item);

            let Some(name) = package
                .get("packageName")
                .or_else(|| package.get("repositoryName"))
                .and_then(|n| n.as_str())
            else {
                continue;
            };

            let owner = package
                .get("repositoryOwner")
                .and_then(|o| o.as_str())
                .map(ToString::to_string);

            let description = package
                .get("summary")
                .and_then(|s| s.as_str())
                .map(ToString::to_string);

            let stars = package.get("stars").and_then(serde_json::Value::as_u64);

            let url = package
                .get("packageURL")
                .and_then(|u| u.as_str())
                .map(|path| {
                    if path.starts_with("http") {
                        path.to_string()
                    } else {
                        format!("https://swiftpackageindex.com{path}")
                    }
                });

            results.push(SearchResult {
                name: name.to_string(),
                owner,
                description,
                stars,
                url,
            });

            if results.len() >= limit {
                break;
            }
        }
    }

    results
}

/// 格式化搜索结果
fn format_search_results(results: &[SearchResult], format: &str) -> String {
    match format {
        "json" => serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string()),
        "text" => {
            use std::fmt::Write;
            let mut output = String::new();

            for (i, result) in results.iter().enumerate() {
                writeln!(output, "{}. {}", i + 1, result.name).unwrap();
                if let Some(owner) = &result.owner {
                    writeln!(output, "   作者: {owner}").unwrap();
                }
                if let Some(stars) = result.stars {
                    writeln!(output, "   Star 数: {stars}").unwrap();
                }
                if let Some(desc) = &result.description {
                    writeln!(output, "   描述: {}", string::truncate_with_ellipsis(desc, 120))
                        .unwrap();
                }
                writeln!(output).unwrap();
            }

            output
        }
        _ => {
            // 默认使用 markdown
            use std::fmt::Write;
            let mut output = String::from("# 搜索结果\n\n");

            if results.is_empty() {
                output.push_str("没有找到匹配的包。\n");
            }

            for (i, result) in results.iter().enumerate() {
                writeln!(output, "## {}. {}", i + 1, result.name).unwrap();
                if let Some(owner) = &result.owner {
                    writeln!(output, "**作者**: {owner}").unwrap();
                }
                if let Some(stars) = result.stars {
                    writeln!(output, "**Star 数**: {stars}").unwrap();
                }
                if let Some(desc) = &result.description {
                    writeln!(output, "**描述**: {desc}").unwrap();
                }
                if let Some(url) = &result.url {
                    writeln!(output, "**链接**: [{url}]({url})").unwrap();
                }
                writeln!(output).unwrap();
            }

            output
        }
    }
}

#[async_trait]
impl Tool for SearchPackagesToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        SearchPackagesTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<
        rust_mcp_sdk::schema::CallToolResult,
        rust_mcp_sdk::schema::CallToolError,
    > {
        let params: SearchPackagesTool = serde_json::from_value(arguments).map_err(|e| {
            rust_mcp_sdk::schema::CallToolError::invalid_arguments(
                "search_packages",
                Some(format!("参数解析失败: {e}")),
            )
        })?;

        validation::validate_search_query(&params.query)
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        let limit = params.limit.unwrap_or(10).min(100); // 限制最大100个结果
        let filters = SearchFilters {
            platform: params
                .platform
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty()),
            limit,
        };

        let results = self.search_packages(&params.query, &filters).await?;

        let format = params.format.unwrap_or_else(|| "markdown".to_string());
        let content = format_search_results(&results, &format);

        Ok(rust_mcp_sdk::schema::CallToolResult::text_content(vec![
            content.into(),
        ]))
    }
}

impl Default for SearchPackagesToolImpl {
    fn default() -> Self {
        Self::new(Arc::new(PackageService::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response_package_entries() {
        let json = serde_json::json!({
            "results": [
                {
                    "package": {
                        "packageName": "Alamofire",
                        "repositoryOwner": "Alamofire",
                        "summary": "Elegant HTTP Networking in Swift",
                        "stars": 40000,
                        "packageURL": "/Alamofire/Alamofire"
                    }
                },
                { "author": { "name": "someone" } }
            ]
        });
        let results = parse_search_response(&json, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Alamofire");
        assert_eq!(results[0].stars, Some(40000));
        assert_eq!(
            results[0].url.as_deref(),
            Some("https://swiftpackageindex.com/Alamofire/Alamofire")
        );
    }

    #[test]
    fn test_parse_search_response_respects_limit() {
        let entries: Vec<serde_json::Value> = (0..20)
            .map(|i| {
                serde_json::json!({
                    "package": { "packageName": format!("Package{i}") }
                })
            })
            .collect();
        let json = serde_json::json!({ "results": entries });
        let results = parse_search_response(&json, 5);
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].name, "Package0");
    }

    #[test]
    fn test_parse_search_response_empty() {
        let results = parse_search_response(&serde_json::json!({}), 10);
        assert!(results.is_empty());
    }
}
