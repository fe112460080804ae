//! MCP tools module
//!
//! Provides MCP tools for Swift package documentation queries.

pub mod health;
pub mod packages;

use crate::utils::metrics::PerformanceCounter;
use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult, Tool as McpTool};
use std::sync::Arc;

/// Tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool definition
    fn definition(&self) -> McpTool;

    /// Execute tool
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError>;
}

/// Tool registry
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    counter: PerformanceCounter,
}

impl ToolRegistry {
    /// Create a new tool registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            counter: PerformanceCounter::new(),
        }
    }

    /// Register tool
    #[must_use]
    pub fn register<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    /// Get all tool definitions
    #[must_use]
    pub fn get_tools(&self) -> Vec<McpTool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Get the performance counter
    #[must_use]
    pub fn counter(&self) -> &PerformanceCounter {
        &self.counter
    }

    /// Execute tool
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        for tool in &self.tools {
            if tool.definition().name == name {
                let start = self.counter.record_request_start();
                let result = tool.execute(arguments).await;
                self.counter.record_request_complete(start, result.is_ok());
                return result;
            }
        }

        Err(CallToolError::unknown_tool(name.to_string()))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create default tool registry
#[must_use]
pub fn create_default_registry(service: &Arc<packages::PackageService>) -> ToolRegistry {
    ToolRegistry::new()
        .register(packages::readme::GetPackageReadmeToolImpl::new(service.clone()))
        .register(packages::info::GetPackageInfoToolImpl::new(service.clone()))
        .register(packages::search::SearchPackagesToolImpl::new(service.clone()))
        .register(health::HealthCheckToolImpl::new())
}
