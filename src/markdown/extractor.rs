//! 用法提取器实现
//!
//! 三个独立入口：用法示例、安装信息、关键词。对同一输入的
//! 重复调用产生逐字节相同的输出；畸形输入退化为空结果而不是报错。

use super::scanner::{self, DocumentScan, FencedBlock, Heading};
use super::{ExtractorConfig, InstallationInfo, UsageExample};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// 描述回溯采集的最大非空行数
const MAX_DESCRIPTION_LINES: usize = 3;

/// 短于此长度的描述视为噪声而丢弃
const MIN_DESCRIPTION_LEN: usize = 10;

/// 短于此长度的代码块不构成示例
const MIN_CODE_LEN: usize = 10;

/// Markdown 用法提取器
#[derive(Debug, Clone, Default)]
pub struct UsageExtractor {
    config: ExtractorConfig,
}

impl UsageExtractor {
    /// 使用给定配置创建提取器
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// 从 README 中提取用法示例
    ///
    /// 内部故障被捕获并转换为空结果，绝不向调用者抛出。
    #[must_use]
    pub fn extract_usage_examples(&self, markdown: &str) -> Vec<UsageExample> {
        catch_unwind(AssertUnwindSafe(|| self.usage_examples_inner(markdown))).unwrap_or_else(
            |_| {
                tracing::warn!("提取用法示例时发生内部错误，返回空结果");
                Vec::new()
            },
        )
    }

    /// 从 README 中提取安装信息
    #[must_use]
    pub fn extract_installation_info(&self, markdown: &str) -> InstallationInfo {
        catch_unwind(AssertUnwindSafe(|| installation_info_inner(markdown))).unwrap_or_else(|_| {
            tracing::warn!("提取安装信息时发生内部错误，返回空结果");
            InstallationInfo::default()
        })
    }

    /// 从 README 中提取关键词
    #[must_use]
    pub fn extract_keywords(&self, markdown: &str) -> Vec<String> {
        catch_unwind(AssertUnwindSafe(|| self.keywords_inner(markdown))).unwrap_or_else(|_| {
            tracing::warn!("提取关键词时发生内部错误，返回空结果");
            Vec::new()
        })
    }

    fn usage_examples_inner(&self, markdown: &str) -> Vec<UsageExample> {
        let lines: Vec<&str> = markdown.lines().collect();
        let scan = scanner::scan(markdown);

        let usage_headings: Vec<&Heading> = scan
            .headings
            .iter()
            .filter(|heading| self.is_usage_heading(&heading.text))
            .collect();

        let mut examples = Vec::new();

        if usage_headings.is_empty() {
            // 没有任何可识别的用法标题：退化为全文档扫描，
            // 保证无标题结构的 README 中的代码不会全部丢失
            for block in &scan.blocks {
                examples.push(self.build_example(
                    "Usage Example".to_string(),
                    block,
                    &lines,
                    &scan,
                ));
            }
        } else {
            for heading in usage_headings {
                let section_end = scan
                    .headings
                    .iter()
                    .map(|h| h.line)
                    .find(|line| *line > heading.line)
                    .unwrap_or(scan.line_count);

                let section_blocks: Vec<&FencedBlock> = scan
                    .blocks
                    .iter()
                    .filter(|block| block.start_line > heading.line && block.start_line < section_end)
                    .collect();

                let multiple = section_blocks.len() > 1;
                for (index, block) in section_blocks.iter().enumerate() {
                    let title = if multiple {
                        format!("{} {}", heading.text, index + 1)
                    } else {
                        heading.text.clone()
                    };
                    examples.push(self.build_example(title, block, &lines, &scan));
                }
            }
        }

        examples.retain(is_valid_example);
        examples.truncate(self.config.max_examples);
        examples
    }

    fn build_example(
        &self,
        title: String,
        block: &FencedBlock,
        lines: &[&str],
        scan: &DocumentScan,
    ) -> UsageExample {
        let description = derive_description(block, lines, scan);
        UsageExample {
            title: title.trim().to_string(),
            description,
            code: block.body.trim().to_string(),
            language: self.normalize_language(block.language.as_deref()),
        }
    }

    fn is_usage_heading(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.config
            .usage_headings
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }

    /// 规范化围栏语言标签
    fn normalize_language(&self, tag: Option<&str>) -> String {
        let Some(tag) = tag else {
            return "text".to_string();
        };
        let lowered = tag.trim().to_lowercase();
        if lowered.is_empty() {
            return "text".to_string();
        }
        self.config
            .language_aliases
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map_or(lowered, |(_, canonical)| canonical.clone())
    }

    fn keywords_inner(&self, markdown: &str) -> Vec<String> {
        let lowered = markdown.to_lowercase();
        let mut keywords = Vec::new();

        // 第一来源：词表的全文子串匹配，按词表顺序
        for term in &self.config.keyword_vocabulary {
            let canonical = term.to_lowercase();
            if lowered.contains(canonical.as_str()) {
                push_unique(&mut keywords, canonical);
            }
        }

        // 第二来源：标题文本，按文档顺序，长度在 (2, 20) 开区间内
        let scan = scanner::scan(markdown);
        for heading in &scan.headings {
            let text = heading.text.trim().to_lowercase();
            let len = text.chars().count();
            if len > 2 && len < 20 {
                push_unique(&mut keywords, text);
            }
        }

        keywords.truncate(self.config.max_keywords);
        keywords
    }
}

/// 有序去重插入
fn push_unique(keywords: &mut Vec<String>, candidate: String) {
    if !keywords.contains(&candidate) {
        keywords.push(candidate);
    }
}

/// 从代码块前的说明文字推导描述
///
/// 从开栏行向上回溯至多 3 个非空行，遇到标题或另一个代码块即停止；
/// 过短的描述视为噪声。
fn derive_description(
    block: &FencedBlock,
    lines: &[&str],
    scan: &DocumentScan,
) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    let mut index = block.start_line;

    while index > 0 && collected.len() < MAX_DESCRIPTION_LINES {
        index -= 1;
        let line = lines.get(index)?.trim();
        if line.is_empty() {
            continue;
        }
        if scan.line_is_heading(index) || scan.line_in_block(index) {
            break;
        }
        collected.push(line);
    }

    collected.reverse();
    let description = collected.join(" ").trim().to_string();
    if description.chars().count() <= MIN_DESCRIPTION_LEN {
        None
    } else {
        Some(description)
    }
}

/// 示例有效性过滤
fn is_valid_example(example: &UsageExample) -> bool {
    let code = example.code.trim();
    if code.chars().count() < MIN_CODE_LEN {
        return false;
    }

    // 全部是 import 或注释的代码块不构成示例
    let only_imports_or_comments = code.lines().filter(|line| !line.trim().is_empty()).all(
        |line| {
            let trimmed = line.trim();
            trimmed.starts_with("import ")
                || trimmed.starts_with("@import")
                || trimmed.starts_with("//")
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*')
                || trimmed.starts_with('#')
        },
    );
    if only_imports_or_comments {
        return false;
    }

    // 命令执行记录的典型痕迹：成功标记、箭头、$ 提示符
    if code.contains('✓') || code.contains('✔') || code.contains('→') || code.contains('➜') {
        return false;
    }
    if code
        .lines()
        .any(|line| line.trim_start().starts_with("$ "))
    {
        return false;
    }

    true
}

/// 安装信息提取，与章节无关的全文档扫描
fn installation_info_inner(markdown: &str) -> InstallationInfo {
    let scan = scanner::scan(markdown);
    let mut info = InstallationInfo::default();

    // SPM：第一个包含包声明调用的围栏代码块，保留原文
    for block in &scan.blocks {
        if block.body.contains(".package(") {
            info.spm = Some(block.body.trim().to_string());
            break;
        }
    }

    // Carthage / CocoaPods：逐行扫描，每种首个匹配即定格
    for line in markdown.lines() {
        let trimmed = line.trim();

        if info.carthage.is_none() && is_carthage_line(trimmed) {
            info.carthage = Some(trimmed.to_string());
        }

        if info.cocoapods.is_none()
            && (trimmed.starts_with("pod '") || trimmed.starts_with("pod \""))
        {
            info.cocoapods = Some(trimmed.to_string());
        }

        if info.carthage.is_some() && info.cocoapods.is_some() {
            break;
        }
    }

    info
}

/// 判断是否为 Carthage 引用行：`github "owner/repo"` 形式
fn is_carthage_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("github \"") else {
        return false;
    };
    rest.split('"').next().is_some_and(|repo| repo.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> UsageExtractor {
        UsageExtractor::default()
    }

    #[test]
    fn test_usage_section_single_block() {
        let doc = "# MyLib\n\n## Usage\n\n```swift\nlet manager = Manager()\nmanager.start()\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].title, "Usage");
        assert_eq!(examples[0].language, "swift");
        assert!(examples[0].code.contains("Manager()"));
    }

    #[test]
    fn test_usage_section_multiple_blocks_numbered() {
        let doc = "## Examples\n\n```swift\nlet a = Client(token: token)\n```\n\n```swift\nlet b = Client(token: token)\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].title, "Examples 1");
        assert_eq!(examples[1].title, "Examples 2");
    }

    #[test]
    fn test_section_ends_at_next_heading() {
        let doc = "## Usage\n\n```swift\nlet a = Widget(frame: .zero)\n```\n\n## License\n\n```text\nMIT License terms here\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        // License 章节的代码块不属于用法章节
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].title, "Usage");
    }

    #[test]
    fn test_fallback_without_usage_headings() {
        let doc = "# MyLib\n\nSome intro.\n\n```swift\nlet value = compute(input)\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].title, "Usage Example");
    }

    #[test]
    fn test_example_cap_at_ten() {
        let mut doc = String::from("## Usage\n\n");
        for i in 0..15 {
            doc.push_str(&format!("```swift\nlet value{i} = Manager().start()\n```\n\n"));
        }
        let examples = extractor().extract_usage_examples(&doc);
        assert_eq!(examples.len(), 10);
        // 文档顺序保持
        assert!(examples[0].code.contains("value0"));
        assert!(examples[9].code.contains("value9"));
    }

    #[test]
    fn test_filter_import_only_block() {
        let doc = "## Usage\n\n```swift\nimport Foundation\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert!(examples.is_empty());
    }

    #[test]
    fn test_filter_shell_transcript() {
        let doc = "## Usage\n\n```\n$ swift build\nBuild complete!\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert!(examples.is_empty());
    }

    #[test]
    fn test_filter_checkmark_transcript() {
        let doc = "## Usage\n\n```\nCompiling MyLib ✓ done successfully\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert!(examples.is_empty());
    }

    #[test]
    fn test_filter_short_code() {
        let doc = "## Usage\n\n```swift\nlet x\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert!(examples.is_empty());
    }

    #[test]
    fn test_description_from_preceding_lines() {
        let doc = "## Usage\n\nCreate a client and start the session immediately.\n\n```swift\nlet client = Client()\nclient.start()\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert_eq!(examples.len(), 1);
        assert_eq!(
            examples[0].description.as_deref(),
            Some("Create a client and start the session immediately.")
        );
    }

    #[test]
    fn test_short_description_discarded() {
        let doc = "## Usage\n\nShort.\n\n```swift\nlet client = Client()\n```\n";
        let examples = extractor().extract_usage_examples(doc);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].description, None);
    }

    #[test]
    fn test_language_normalization() {
        let extractor = extractor();
        assert_eq!(extractor.normalize_language(Some("JS")), "javascript");
        assert_eq!(extractor.normalize_language(Some("sh")), "bash");
        assert_eq!(extractor.normalize_language(Some("yml")), "yaml");
        assert_eq!(extractor.normalize_language(Some("objective-c")), "objc");
        assert_eq!(extractor.normalize_language(Some("swift")), "swift");
        assert_eq!(extractor.normalize_language(Some("unknown-tag")), "unknown-tag");
        assert_eq!(extractor.normalize_language(None), "text");
    }

    #[test]
    fn test_installation_spm() {
        let doc = "## Installation\n\n```swift\ndependencies: [\n    .package(url: \"https://github.com/owner/MyLib.git\", from: \"1.0.0\")\n]\n```\n";
        let info = extractor().extract_installation_info(doc);
        assert!(info.spm.is_some_and(|snippet| snippet.contains(".package(")));
        assert!(info.carthage.is_none());
        assert!(info.cocoapods.is_none());
    }

    #[test]
    fn test_installation_cocoapods() {
        let doc = "Add to your Podfile:\n\n```ruby\npod 'Alamofire', '~> 5.0'\n```\n";
        let info = extractor().extract_installation_info(doc);
        assert!(info
            .cocoapods
            .is_some_and(|snippet| snippet.contains("pod 'Alamofire'")));
    }

    #[test]
    fn test_installation_carthage() {
        let doc = "```\ngithub \"Alamofire/Alamofire\" ~> 5.0\n```\n";
        let info = extractor().extract_installation_info(doc);
        assert_eq!(
            info.carthage.as_deref(),
            Some("github \"Alamofire/Alamofire\" ~> 5.0")
        );
    }

    #[test]
    fn test_installation_empty_document() {
        let info = extractor().extract_installation_info("# Nothing here\n\nplain text\n");
        assert!(info.is_empty());
    }

    #[test]
    fn test_keywords_capped_at_ten() {
        let doc = "# Package\n\nswift ios macos tvos watchos xcode uikit swiftui foundation combine async await actor concurrency networking json rest api http extra keywords";
        let keywords = extractor().extract_keywords(doc);
        assert!(keywords.len() <= 10);
        assert_eq!(keywords[0], "swift");
    }

    #[test]
    fn test_keywords_include_headings() {
        let doc = "# Networking Layer\n\nplain text without vocabulary terms here\n";
        let keywords = extractor().extract_keywords(doc);
        // 词表匹配在前（networking 出现在标题里也算全文匹配），标题在后
        assert!(keywords.contains(&"networking".to_string()));
        assert!(keywords.contains(&"networking layer".to_string()));
    }

    #[test]
    fn test_keywords_heading_length_bounds() {
        let doc = "# ab\n\n# this heading is definitely longer than twenty characters\n";
        let keywords = extractor().extract_keywords(doc);
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_results() {
        let extractor = extractor();
        assert!(extractor.extract_usage_examples("").is_empty());
        assert!(extractor.extract_installation_info("").is_empty());
        assert!(extractor.extract_keywords("").is_empty());
    }

    #[test]
    fn test_determinism() {
        let doc = "## Usage\n\nBuild a request and send it to the server.\n\n```swift\nlet request = Request(url: url)\nsend(request)\n```\n\nswift ios networking\n";
        let extractor = extractor();
        assert_eq!(
            extractor.extract_usage_examples(doc),
            extractor.extract_usage_examples(doc)
        );
        assert_eq!(
            extractor.extract_installation_info(doc),
            extractor.extract_installation_info(doc)
        );
        assert_eq!(extractor.extract_keywords(doc), extractor.extract_keywords(doc));
    }
}
