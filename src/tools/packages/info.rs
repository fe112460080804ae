//! 获取包信息工具
#![allow(missing_docs)]

use crate::tools::packages::cache::PackageCaches;
use crate::tools::packages::{DependencyInfo, PackageMetadata, PackageService};
use crate::tools::Tool;
use crate::utils::validation;
use async_trait::async_trait;
use rust_mcp_sdk::schema::CallToolError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 获取包信息工具
#[rust_mcp_sdk::macros::mcp_tool(
    name = "get_package_info",
    title = "获取 Swift 包信息",
    description = "获取 Swift 包的元数据：描述、版本、Star 数、许可证、支持平台、Swift 版本和依赖列表。数据合并自 GitHub 和 Swift Package Index。",
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
pub struct GetPackageInfoTool {
    /// 包名、owner/repo 或 GitHub URL
    #[json_schema(title = "包名", description = "要查询的 Swift 包（包名、owner/repo 或 GitHub URL）")]
    pub package_name: String,

    /// 是否包含依赖列表
    #[json_schema(title = "包含依赖", description = "是否解析并返回 Package.resolved 中的依赖列表", default = true)]
    pub include_dependencies: Option<bool>,

    /// 输出格式：markdown、text 或 json
    #[json_schema(title = "输出格式", description = "包信息的输出格式", default = "markdown")]
    pub format: Option<String>,
}

/// 获取包信息工具实现
pub struct GetPackageInfoToolImpl {
    service: Arc<PackageService>,
}

impl GetPackageInfoToolImpl {
    /// 创建新的包信息工具实例
    #[must_use]
    pub fn new(service: Arc<PackageService>) -> Self {
        Self { service }
    }

    /// 获取包元数据
    async fn fetch_metadata(
        &self,
        owner: &str,
        repo: &str,
        include_dependencies: bool,
    ) -> std::result::Result<PackageMetadata, CallToolError> {
        let key = PackageCaches::repo_key(owner, repo);
        if let Some(cached) = self.service.caches().metadata().get(&key).await {
            return Ok(cached);
        }

        let _permit = self
            .service
            .rate_limiter()
            .acquire()
            .await
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        let mut metadata = self.fetch_github_metadata(owner, repo).await?;

        // Swift Package Index 的平台和 Swift 版本信息是补充性的，
        // 拉取失败时退化为仅 GitHub 元数据
        if let Err(e) = self.merge_spi_metadata(owner, repo, &mut metadata).await {
            tracing::debug!("Swift Package Index 元数据不可用: {e}");
        }

        if include_dependencies {
            metadata.dependencies = self.fetch_dependencies(owner, repo).await;
        }

        self.service.caches().metadata().set(&key, &metadata).await;

        Ok(metadata)
    }

    /// 从 GitHub 仓库接口获取基础元数据
    async fn fetch_github_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<PackageMetadata, CallToolError> {
        let url = format!("https://api.github.com/repos/{owner}/{repo}");
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
                "获取仓库信息失败: HTTP {} ({owner}/{repo})",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallToolError::from_message(format!("JSON 解析失败: {e}")))?;

        Ok(PackageMetadata {
            name: json
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or(repo)
                .to_string(),
            owner: json
                .pointer("/owner/login")
                .and_then(|v| v.as_str())
                .unwrap_or(owner)
                .to_string(),
            repo: repo.to_string(),
            description: json
                .get("description")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            version: None,
            stars: json.get("stargazers_count").and_then(serde_json::Value::as_u64),
            license: json
                .pointer("/license/spdx_id")
                .and_then(|v| v.as_str())
                .filter(|id| *id != "NOASSERTION")
                .map(ToString::to_string),
            platforms: Vec::new(),
            swift_versions: Vec::new(),
            dependencies: Vec::new(),
            repository_url: json
                .get("html_url")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            documentation_url: Some(format!("https://swiftpackageindex.com/{owner}/{repo}")),
        })
    }

    /// 合并 Swift Package Index 的补充元数据
    async fn merge_spi_metadata(
        &self,
        owner: &str,
        repo: &str,
        metadata: &mut PackageMetadata,
    ) -> std::result::Result<(), CallToolError> {
        let url = format!("https://swiftpackageindex.com/api/packages/{owner}/{repo}");
        let response = self
            .service
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| CallToolError::from_message(format!("HTTP 请求失败: {e}")))?;

        if !response.status().is_success() {
            return Err(CallToolError::from_message(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallToolError::from_message(format!("JSON 解析失败: {e}")))?;

        if let Some(version) = json
            .pointer("/latestVersion")
            .or_else(|| json.pointer("/latest_version"))
            .and_then(|v| v.as_str())
        {
            metadata.version = Some(version.to_string());
        }

        if let Some(platforms) = json.get("platforms").and_then(|v| v.as_array()) {
            metadata.platforms = platforms
                .iter()
                .filter_map(|p| {
                    p.as_str()
                        .map(ToString::to_string)
                        .or_else(|| p.get("name").and_then(|n| n.as_str()).map(ToString::to_string))
                })
                .collect();
        }

        if let Some(versions) = json
            .get("swiftVersions")
            .or_else(|| json.get("swift_versions"))
            .and_then(|v| v.as_array())
        {
            metadata.swift_versions = versions
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect();
        }

        Ok(())
    }

    /// 从 Package.resolved 解析依赖列表
    ///
    /// 支持 v1（object.pins）和 v2+（pins）两种格式；任何失败都
    /// 退化为空列表而不是报错。
    async fn fetch_dependencies(&self, owner: &str, repo: &str) -> Vec<DependencyInfo> {
        let url =
            format!("https://raw.githubusercontent.com/{owner}/{repo}/HEAD/Package.resolved");

        let Ok(response) = self.service.client().get(&url).send().await else {
            return Vec::new();
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        let Ok(json) = response.json::<serde_json::Value>().await else {
            return Vec::new();
        };

        parse_resolved_dependencies(&json)
    }
}

/// 解析 Package.resolved 的 pin 列表
fn parse_resolved_dependencies(json: &serde_json::Value) -> Vec<DependencyInfo> {
    let pins = json
        .get("pins")
        .or_else(|| json.pointer("/object/pins"))
        .and_then(|v| v.as_array());

    let Some(pins) = pins else {
        return Vec::new();
    };

    pins.iter()
        .filter_map(|pin| {
            let name = pin
                .get("identity")
                .or_else(|| pin.get("package"))
                .and_then(|v| v.as_str())?
                .to_string();

            let url = pin
                .get("location")
                .or_else(|| pin.get("repositoryURL"))
                .and_then(|v| v.as_str())
                .map(ToString::to_string);

            let requirement = pin
                .pointer("/state/version")
                .or_else(|| pin.pointer("/state/revision"))
                .and_then(|v| v.as_str())
                .map(ToString::to_string);

            Some(DependencyInfo {
                name,
                url,
                requirement,
            })
        })
        .collect()
}

/// 格式化包信息
fn format_metadata(metadata: &PackageMetadata, format: &str) -> String {
    match format {
        "json" => serde_json::to_string_pretty(metadata).unwrap_or_else(|_| "{}".to_string()),
        "text" => {
            use std::fmt::Write;
            let mut output = String::new();

            writeln!(output, "{}/{}", metadata.owner, metadata.name).unwrap();
            if let Some(desc) = &metadata.description {
                writeln!(output, "描述: {desc}").unwrap();
            }
            if let Some(version) = &metadata.version {
                writeln!(output, "版本: {version}").unwrap();
            }
            if let Some(stars) = metadata.stars {
                writeln!(output, "Star 数: {stars}").unwrap();
            }
            if let Some(license) = &metadata.license {
                writeln!(output, "许可证: {license}").unwrap();
            }
            if !metadata.dependencies.is_empty() {
                writeln!(output, "依赖 ({}):", metadata.dependencies.len()).unwrap();
                for dep in &metadata.dependencies {
                    writeln!(output, "  - {}", dep.name).unwrap();
                }
            }

            output
        }
        _ => {
            use std::fmt::Write;
            let mut output = format!("# {}/{}\n\n", metadata.owner, metadata.name);

            if let Some(desc) = &metadata.description {
                writeln!(output, "{desc}\n").unwrap();
            }
            if let Some(version) = &metadata.version {
                writeln!(output, "**版本**: {version}").unwrap();
            }
            if let Some(stars) = metadata.stars {
                writeln!(output, "**Star 数**: {stars}").unwrap();
            }
            if let Some(license) = &metadata.license {
                writeln!(output, "**许可证**: {license}").unwrap();
            }
            if !metadata.platforms.is_empty() {
                writeln!(output, "**平台**: {}", metadata.platforms.join(", ")).unwrap();
            }
            if !metadata.swift_versions.is_empty() {
                writeln!(output, "**Swift 版本**: {}", metadata.swift_versions.join(", ")).unwrap();
            }
            if let Some(repo_url) = &metadata.repository_url {
                writeln!(output, "**仓库**: [链接]({repo_url})").unwrap();
            }
            if let Some(docs_url) = &metadata.documentation_url {
                writeln!(output, "**文档**: [链接]({docs_url})").unwrap();
            }

            if !metadata.dependencies.is_empty() {
                writeln!(output, "\n## 依赖\n").unwrap();
                for dep in &metadata.dependencies {
                    match (&dep.url, &dep.requirement) {
                        (Some(url), Some(req)) => {
                            writeln!(output, "- [{}]({url}) `{req}`", dep.name).unwrap();
                        }
                        (Some(url), None) => writeln!(output, "- [{}]({url})", dep.name).unwrap(),
                        _ => writeln!(output, "- {}", dep.name).unwrap(),
                    }
                }
            }

            output
        }
    }
}

#[async_trait]
impl Tool for GetPackageInfoToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        GetPackageInfoTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<rust_mcp_sdk::schema::CallToolResult, rust_mcp_sdk::schema::CallToolError>
    {
        let params: GetPackageInfoTool = serde_json::from_value(arguments).map_err(|e| {
            rust_mcp_sdk::schema::CallToolError::invalid_arguments(
                "get_package_info",
                Some(format!("参数解析失败: {e}")),
            )
        })?;

        validation::validate_package_reference(&params.package_name)
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        let (owner, repo) = self.service.resolve_repository(&params.package_name).await?;
        let include_dependencies = params.include_dependencies.unwrap_or(true);
        let metadata = self
            .fetch_metadata(&owner, &repo, include_dependencies)
            .await?;

        let format = params.format.unwrap_or_else(|| "markdown".to_string());
        let content = format_metadata(&metadata, &format);

        Ok(rust_mcp_sdk::schema::CallToolResult::text_content(vec![
            content.into(),
        ]))
    }
}

impl Default for GetPackageInfoToolImpl {
    fn default() -> Self {
        Self::new(Arc::new(PackageService::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolved_dependencies_v2() {
        let json = serde_json::json!({
            "pins": [
                {
                    "identity": "swift-nio",
                    "location": "https://github.com/apple/swift-nio.git",
                    "state": { "version": "2.65.0" }
                }
            ],
            "version": 2
        });
        let deps = parse_resolved_dependencies(&json);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "swift-nio");
        assert_eq!(deps[0].requirement.as_deref(), Some("2.65.0"));
    }

    #[test]
    fn test_parse_resolved_dependencies_v1() {
        let json = serde_json::json!({
            "object": {
                "pins": [
                    {
                        "package": "Alamofire",
                        "repositoryURL": "https://github.com/Alamofire/Alamofire.git",
                        "state": { "revision": "abc123" }
                    }
                ]
            },
            "version": 1
        });
        let deps = parse_resolved_dependencies(&json);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "Alamofire");
        assert_eq!(deps[0].requirement.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_resolved_dependencies_malformed() {
        let deps = parse_resolved_dependencies(&serde_json::json!({"unexpected": true}));
        assert!(deps.is_empty());
    }

    #[test]
    fn test_format_metadata_markdown() {
        let metadata = PackageMetadata {
            name: "Alamofire".to_string(),
            owner: "Alamofire".to_string(),
            repo: "Alamofire".to_string(),
            description: Some("Elegant HTTP Networking in Swift".to_string()),
            stars: Some(40000),
            license: Some("MIT".to_string()),
            ..PackageMetadata::default()
        };
        let output = format_metadata(&metadata, "markdown");
        assert!(output.contains("# Alamofire/Alamofire"));
        assert!(output.contains("**Star 数**: 40000"));
        assert!(output.contains("**许可证**: MIT"));
    }
}
