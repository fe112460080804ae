//! 获取包 README 工具
#![allow(missing_docs)]

use crate::tools::packages::cache::PackageCaches;
use crate::tools::packages::{PackageService, ParsedReadme};
use crate::tools::Tool;
use crate::utils::validation;
use async_trait::async_trait;
use base64::Engine;
use rust_mcp_sdk::schema::CallToolError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 获取包 README 工具
#[rust_mcp_sdk::macros::mcp_tool(
    name = "get_package_readme",
    title = "获取 Swift 包 README",
    description = "获取 Swift 包的 README，并从中提取用法示例、安装片段和关键词。支持裸包名、owner/repo 或 GitHub URL。",
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
#[derive(Debug, Clone, Deserialize, Serialize, rust_mcp_sdk::macros::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetPackageReadmeTool {
    /// 包名、owner/repo 或 GitHub URL
    #[json_schema(title = "包名", description = "要查询的 Swift 包（包名、owner/repo 或 GitHub URL）")]
    pub package_name: String,

    /// 输出格式：markdown、text 或 json
    #[json_schema(title = "输出格式", description = "README 解析结果的输出格式", default = "markdown")]
    pub format: Option<String>,
}

/// 获取包 README 工具实现
pub struct GetPackageReadmeToolImpl {
    service: Arc<PackageService>,
}

impl GetPackageReadmeToolImpl {
    /// 创建新的 README 工具实例
    #[must_use]
    pub fn new(service: Arc<PackageService>) -> Self {
        Self { service }
    }

    /// 获取并解析 README
    ///
    /// 先探测 README 分区；未命中时从 GitHub README 接口拉取原文，
    /// 运行提取器并把解析结果写回缓存。
    async fn fetch_readme(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<ParsedReadme, CallToolError> {
        let key = PackageCaches::repo_key(owner, repo);
        if let Some(cached) = self.service.caches().readme().get(&key).await {
            return Ok(cached);
        }

        let _permit = self
            .service
            .rate_limiter()
            .acquire()
            .await
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        let url = format!("https://api.github.com/repos/{owner}/{repo}/readme");
        let response = self
            .service
            .client()
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| CallToolError::from_message(format!("HTTP 请求失败: {e}")))?;

        if !response.status().is_success() {
            return Err(CallToolError::from_message(format!(
                "获取 README 失败: HTTP {} ({owner}/{repo})",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallToolError::from_message(format!("JSON 解析失败: {e}")))?;

        let markdown = decode_readme_content(&json)
            .ok_or_else(|| CallToolError::from_message("README 响应缺少内容字段".to_string()))?;

        let extractor = self.service.extractor();
        let parsed = ParsedReadme {
            examples: extractor.extract_usage_examples(&markdown),
            installation: extractor.extract_installation_info(&markdown),
            keywords: extractor.extract_keywords(&markdown),
            raw: markdown,
        };

        self.service.caches().readme().set(&key, &parsed).await;

        Ok(parsed)
    }
}

/// 解码 GitHub README 接口返回的 base64 内容
fn decode_readme_content(json: &serde_json::Value) -> Option<String> {
    let content = json.get("content").and_then(|c| c.as_str())?;
    let encoding = json
        .get("encoding")
        .and_then(|e| e.as_str())
        .unwrap_or("base64");

    if encoding == "base64" {
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Some(content.to_string())
    }
}

/// 格式化解析结果
fn format_readme(owner: &str, repo: &str, parsed: &ParsedReadme, format: &str) -> String {
    match format {
        "json" => serde_json::to_string_pretty(parsed).unwrap_or_else(|_| "{}".to_string()),
        "text" => {
            use std::fmt::Write;
            let mut output = String::new();

            writeln!(output, "{owner}/{repo}").unwrap();
            for example in &parsed.examples {
                writeln!(output, "\n{} [{}]", example.title, example.language).unwrap();
                if let Some(desc) = &example.description {
                    writeln!(output, "{desc}").unwrap();
                }
                writeln!(output, "{}", example.code).unwrap();
            }
            if !parsed.keywords.is_empty() {
                writeln!(output, "\n关键词: {}", parsed.keywords.join(", ")).unwrap();
            }

            output
        }
        _ => {
            // markdown（默认）
            use std::fmt::Write;
            let mut output = format!("# {owner}/{repo} 用法\n\n");

            if parsed.examples.is_empty() {
                output.push_str("未能从 README 中提取到用法示例。\n");
            }

            for example in &parsed.examples {
                writeln!(output, "## {}", example.title).unwrap();
                if let Some(desc) = &example.description {
                    writeln!(output, "\n{desc}").unwrap();
                }
                writeln!(output, "\n```{}\n{}\n```\n", example.language, example.code).unwrap();
            }

            let installation = &parsed.installation;
            if !installation.is_empty() {
                output.push_str("## 安装\n");
                if let Some(spm) = &installation.spm {
                    writeln!(output, "\n**Swift Package Manager**:\n\n```swift\n{spm}\n```").unwrap();
                }
                if let Some(carthage) = &installation.carthage {
                    writeln!(output, "\n**Carthage**:\n\n```\n{carthage}\n```").unwrap();
                }
                if let Some(cocoapods) = &installation.cocoapods {
                    writeln!(output, "\n**CocoaPods**:\n\n```ruby\n{cocoapods}\n```").unwrap();
                }
                output.push('\n');
            }

            if !parsed.keywords.is_empty() {
                writeln!(output, "**关键词**: {}", parsed.keywords.join(", ")).unwrap();
            }

            output
        }
    }
}

#[async_trait]
impl Tool for GetPackageReadmeToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        GetPackageReadmeTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<rust_mcp_sdk::schema::CallToolResult, rust_mcp_sdk::schema::CallToolError>
    {
        let params: GetPackageReadmeTool = serde_json::from_value(arguments).map_err(|e| {
            rust_mcp_sdk::schema::CallToolError::invalid_arguments(
                "get_package_readme",
                Some(format!("参数解析失败: {e}")),
            )
        })?;

        validation::validate_package_reference(&params.package_name)
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        let (owner, repo) = self.service.resolve_repository(&params.package_name).await?;
        let parsed = self.fetch_readme(&owner, &repo).await?;

        let format = params.format.unwrap_or_else(|| "markdown".to_string());
        let content = format_readme(&owner, &repo, &parsed, &format);

        Ok(rust_mcp_sdk::schema::CallToolResult::text_content(vec![
            content.into(),
        ]))
    }
}

impl Default for GetPackageReadmeToolImpl {
    fn default() -> Self {
        Self::new(Arc::new(PackageService::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_readme_content_base64() {
        // "# Title\n" 的 base64，GitHub 风格带换行
        let json = serde_json::json!({
            "content": "IyBUaXRs\nZQo=",
            "encoding": "base64"
        });
        assert_eq!(decode_readme_content(&json).as_deref(), Some("# Title\n"));
    }

    #[test]
    fn test_decode_readme_content_missing_field() {
        let json = serde_json::json!({ "encoding": "base64" });
        assert!(decode_readme_content(&json).is_none());
    }

    #[test]
    fn test_format_readme_markdown_lists_examples() {
        let parsed = ParsedReadme {
            raw: String::new(),
            examples: vec![crate::markdown::UsageExample {
                title: "Usage".to_string(),
                description: None,
                code: "let x = Manager()".to_string(),
                language: "swift".to_string(),
            }],
            installation: crate::markdown::InstallationInfo::default(),
            keywords: vec!["swift".to_string()],
        };
        let output = format_readme("owner", "repo", &parsed, "markdown");
        assert!(output.contains("## Usage"));
        assert!(output.contains("```swift"));
        assert!(output.contains("**关键词**: swift"));
    }
}
