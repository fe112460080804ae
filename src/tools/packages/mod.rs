//! Package query tools module

pub mod cache;
pub mod info;
pub mod readme;
pub mod search;

use crate::cache::Cache;
use crate::markdown::{ExtractorConfig, InstallationInfo, UsageExample, UsageExtractor};
use crate::utils::{HttpClientBuilder, RateLimiter};
use rust_mcp_sdk::schema::CallToolError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Package metadata merged from GitHub and the Swift Package Index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package name
    pub name: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Short description
    pub description: Option<String>,
    /// Latest known version
    pub version: Option<String>,
    /// GitHub star count
    pub stars: Option<u64>,
    /// License identifier
    pub license: Option<String>,
    /// Supported platforms
    pub platforms: Vec<String>,
    /// Supported Swift versions
    pub swift_versions: Vec<String>,
    /// Resolved dependencies
    pub dependencies: Vec<DependencyInfo>,
    /// Repository URL
    pub repository_url: Option<String>,
    /// Documentation URL
    pub documentation_url: Option<String>,
}

/// One resolved dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Dependency identity
    pub name: String,
    /// Repository URL
    pub url: Option<String>,
    /// Version requirement or pinned revision
    pub requirement: Option<String>,
}

/// A parsed README document with everything the extractor produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedReadme {
    /// Raw markdown as fetched
    pub raw: String,
    /// Extracted usage examples
    pub examples: Vec<UsageExample>,
    /// Extracted installation snippets
    pub installation: InstallationInfo,
    /// Extracted keywords
    pub keywords: Vec<String>,
}

/// Search filter set; part of the search cache key
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilters {
    /// Platform qualifier (ios, macos, ...)
    pub platform: Option<String>,
    /// Maximum number of results
    pub limit: u32,
}

/// One search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Package name
    pub name: String,
    /// Repository owner
    pub owner: Option<String>,
    /// Short description
    pub description: Option<String>,
    /// GitHub star count
    pub stars: Option<u64>,
    /// Package URL
    pub url: Option<String>,
}

/// Package service: shared HTTP client, caches and extractor
pub struct PackageService {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    caches: cache::PackageCaches,
    extractor: UsageExtractor,
    rate_limiter: RateLimiter,
}

impl PackageService {
    /// Create a new package service with the default extractor configuration
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_extractor(cache, ExtractorConfig::default())
    }

    /// Create a new package service with a custom extractor configuration
    pub fn with_extractor(cache: Arc<dyn Cache>, extractor_config: ExtractorConfig) -> Self {
        let caches = cache::PackageCaches::new(cache.clone());
        Self {
            client: HttpClientBuilder::new()
                .build()
                .expect("Failed to create HTTP client"),
            cache,
            caches,
            extractor: UsageExtractor::new(extractor_config),
            rate_limiter: RateLimiter::new(50),
        }
    }

    /// Get HTTP client
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Get the shared cache
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Get the partitioned package caches
    #[must_use]
    pub fn caches(&self) -> &cache::PackageCaches {
        &self.caches
    }

    /// Get the markdown extractor
    #[must_use]
    pub fn extractor(&self) -> &UsageExtractor {
        &self.extractor
    }

    /// Get the upstream rate limiter
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Resolve a package reference to `(owner, repo)`
    ///
    /// Tries, in order: a full GitHub URL, an `owner/repo` pair, and a
    /// GitHub repository search for bare package names. Stops at the first
    /// pattern that succeeds.
    pub async fn resolve_repository(
        &self,
        package_name: &str,
    ) -> std::result::Result<(String, String), CallToolError> {
        let trimmed = package_name.trim().trim_end_matches(".git");

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Some((owner, repo)) = parse_repo_url(trimmed) {
                return Ok((owner, repo));
            }
            return Err(CallToolError::from_message(format!(
                "无法从 URL 解析仓库: {package_name}"
            )));
        }

        let mut segments = trimmed.split('/');
        if let (Some(owner), Some(repo), None) =
            (segments.next(), segments.next(), segments.next())
        {
            if !owner.is_empty() && !repo.is_empty() {
                return Ok((owner.to_string(), repo.to_string()));
            }
        }

        self.search_repository(trimmed).await
    }

    /// Find the best-matching Swift repository for a bare package name
    async fn search_repository(
        &self,
        name: &str,
    ) -> std::result::Result<(String, String), CallToolError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| CallToolError::from_message(e.to_string()))?;

        let url = format!(
            "https://api.github.com/search/repositories?q={}+language:swift&per_page=1",
            urlencoding::encode(name)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| CallToolError::from_message(format!("HTTP 请求失败: {e}")))?;

        if !response.status().is_success() {
            return Err(CallToolError::from_message(format!(
                "仓库搜索失败: HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CallToolError::from_message(format!("JSON 解析失败: {e}")))?;

        let item = json
            .get("items")
            .and_then(|items| items.as_array())
            .and_then(|items| items.first())
            .ok_or_else(|| {
                CallToolError::from_message(format!("未找到匹配的 Swift 包: {name}"))
            })?;

        let owner = item
            .pointer("/owner/login")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CallToolError::from_message("搜索结果缺少 owner 字段".to_string()))?;
        let repo = item
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CallToolError::from_message("搜索结果缺少 name 字段".to_string()))?;

        Ok((owner.to_string(), repo.to_string()))
    }
}

/// Extract `(owner, repo)` from a repository URL
fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let parsed = url::Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner, repo))
}

impl Default for PackageService {
    fn default() -> Self {
        let cache = Arc::new(crate::cache::memory::MemoryCache::new(
            100 * 1024 * 1024,
            std::time::Duration::from_secs(3600),
        ));
        Self::new(cache)
    }
}

/// 重新导出工具
pub use info::GetPackageInfoTool;
pub use readme::GetPackageReadmeTool;
pub use search::SearchPackagesTool;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() {
        assert_eq!(
            parse_repo_url("https://github.com/Alamofire/Alamofire"),
            Some(("Alamofire".to_string(), "Alamofire".to_string()))
        );
        assert_eq!(
            parse_repo_url("https://github.com/apple/swift-nio.git"),
            Some(("apple".to_string(), "swift-nio".to_string()))
        );
        assert_eq!(parse_repo_url("https://github.com/"), None);
    }
}
