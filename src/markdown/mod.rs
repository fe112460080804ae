//! Markdown 用法提取模块
//!
//! 从 README 文档中提取用法示例、安装片段和关键词。
//! 纯文本变换，无 I/O，无共享可变状态。

pub mod extractor;
pub mod scanner;

pub use extractor::UsageExtractor;

use serde::{Deserialize, Serialize};

/// 用法示例
///
/// 由提取器产生，返回后不可变；顺序即文档顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageExample {
    /// 示例标题
    pub title: String,

    /// 示例描述（来自代码块前的说明文字）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 代码内容
    pub code: String,

    /// 规范化后的语言标签
    pub language: String,
}

/// 安装信息
///
/// 每种包管理工具至多一个片段，均为文档原文。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationInfo {
    /// Swift Package Manager 依赖声明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spm: Option<String>,

    /// Carthage 引用行
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carthage: Option<String>,

    /// CocoaPods 引用行
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cocoapods: Option<String>,
}

impl InstallationInfo {
    /// 是否没有任何安装片段
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spm.is_none() && self.carthage.is_none() && self.cocoapods.is_none()
    }
}

/// 提取器配置
///
/// 词表是配置数据而不是内联逻辑，可以通过配置文件扩展。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// 识别用法章节的标题短语（小写）
    #[serde(default = "default_usage_headings")]
    pub usage_headings: Vec<String>,

    /// 关键词词表（规范形式为小写）
    #[serde(default = "default_keyword_vocabulary")]
    pub keyword_vocabulary: Vec<String>,

    /// 语言标签别名表（别名 -> 规范名）
    #[serde(default = "default_language_aliases")]
    pub language_aliases: Vec<(String, String)>,

    /// 返回的示例数量上限
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// 返回的关键词数量上限
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            usage_headings: default_usage_headings(),
            keyword_vocabulary: default_keyword_vocabulary(),
            language_aliases: default_language_aliases(),
            max_examples: default_max_examples(),
            max_keywords: default_max_keywords(),
        }
    }
}

fn default_usage_headings() -> Vec<String> {
    [
        "usage",
        "getting started",
        "quick start",
        "quickstart",
        "example",
        "examples",
        "tutorial",
        "basic usage",
        "api usage",
        "installation and usage",
        "how to use",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_keyword_vocabulary() -> Vec<String> {
    [
        "swift",
        "swiftui",
        "uikit",
        "appkit",
        "ios",
        "macos",
        "tvos",
        "watchos",
        "visionos",
        "xcode",
        "objective-c",
        "foundation",
        "combine",
        "async",
        "await",
        "actor",
        "concurrency",
        "networking",
        "http",
        "rest",
        "api",
        "json",
        "codable",
        "websocket",
        "graphql",
        "database",
        "persistence",
        "keychain",
        "bluetooth",
        "animation",
        "layout",
        "testing",
        "mock",
        "dependency injection",
        "cryptography",
        "push notifications",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_language_aliases() -> Vec<(String, String)> {
    [
        ("js", "javascript"),
        ("ts", "typescript"),
        ("sh", "bash"),
        ("shell", "bash"),
        ("zsh", "bash"),
        ("fish", "bash"),
        ("yml", "yaml"),
        ("md", "markdown"),
        ("objective-c", "objc"),
        ("objectivec", "objc"),
        ("obj-c", "objc"),
        ("py", "python"),
        ("rb", "ruby"),
    ]
    .iter()
    .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
    .collect()
}

fn default_max_examples() -> usize {
    10
}

fn default_max_keywords() -> usize {
    10
}
