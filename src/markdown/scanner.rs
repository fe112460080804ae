//! Markdown 结构扫描器
//!
//! 单遍逐行扫描，产出标题和围栏代码块事件。
//! 不使用正则引擎，任意输入下都是线性时间。

/// 标题事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 标题所在行号（0 起始）
    pub line: usize,
    /// 标题级别（1-6）
    pub level: u8,
    /// 标题文本（去除 # 和首尾空白）
    pub text: String,
}

/// 围栏代码块事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    /// 开栏行号（0 起始）
    pub start_line: usize,
    /// 闭栏行号；未闭合时为文档最后一行
    pub end_line: usize,
    /// 围栏语言标签（未标注时为 None）
    pub language: Option<String>,
    /// 代码块正文，首尾空行已去除
    pub body: String,
}

/// 文档扫描结果
#[derive(Debug, Clone, Default)]
pub struct DocumentScan {
    /// 全部标题，文档顺序
    pub headings: Vec<Heading>,
    /// 全部围栏代码块，文档顺序
    pub blocks: Vec<FencedBlock>,
    /// 文档总行数
    pub line_count: usize,
}

impl DocumentScan {
    /// 判断某一行是否落在围栏代码块内（含围栏行本身）
    #[must_use]
    pub fn line_in_block(&self, line: usize) -> bool {
        self.blocks
            .iter()
            .any(|block| line >= block.start_line && line <= block.end_line)
    }

    /// 判断某一行是否是标题行
    #[must_use]
    pub fn line_is_heading(&self, line: usize) -> bool {
        self.headings.iter().any(|heading| heading.line == line)
    }
}

/// 判断一行是否为围栏分隔线，返回围栏后的信息串
fn fence_info(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed.strip_prefix("```")
}

/// 解析标题行，返回级别和文本
fn parse_heading(line: &str) -> Option<(u8, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    let rest = &trimmed[level..];
    // "#标题" 不是 ATX 标题，"#" 之后必须是空白或行尾
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    Some((level as u8, rest.trim().to_string()))
}

/// 去除正文首尾的空白行
fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

/// 扫描整篇文档
///
/// 围栏内的行不会被识别为标题；未闭合的围栏在文档末尾收口。
#[must_use]
pub fn scan(markdown: &str) -> DocumentScan {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut headings = Vec::new();
    let mut blocks = Vec::new();

    // (开栏行号, 语言标签, 正文行)
    let mut open_fence: Option<(usize, Option<String>, Vec<&str>)> = None;

    for (index, line) in lines.iter().enumerate() {
        match open_fence.take() {
            Some((start_line, language, body_lines)) => {
                if fence_info(line).is_some_and(|info| info.trim().is_empty()) {
                    blocks.push(FencedBlock {
                        start_line,
                        end_line: index,
                        language,
                        body: trim_blank_lines(&body_lines),
                    });
                } else {
                    let mut body_lines = body_lines;
                    body_lines.push(line);
                    open_fence = Some((start_line, language, body_lines));
                }
            }
            None => {
                if let Some(info) = fence_info(line) {
                    let tag = info.trim().split_whitespace().next().unwrap_or("");
                    let language = if tag.is_empty() {
                        None
                    } else {
                        Some(tag.to_string())
                    };
                    open_fence = Some((index, language, Vec::new()));
                } else if let Some((level, text)) = parse_heading(line) {
                    headings.push(Heading {
                        line: index,
                        level,
                        text,
                    });
                }
            }
        }
    }

    // 未闭合的围栏：收口到文档末尾
    if let Some((start_line, language, body_lines)) = open_fence {
        blocks.push(FencedBlock {
            start_line,
            end_line: lines.len().saturating_sub(1),
            language,
            body: trim_blank_lines(&body_lines),
        });
    }

    DocumentScan {
        headings,
        blocks,
        line_count: lines.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_headings() {
        let doc = "# Title\n\nsome text\n\n## Usage\n\nmore text\n";
        let scan = scan(doc);
        assert_eq!(scan.headings.len(), 2);
        assert_eq!(scan.headings[0].level, 1);
        assert_eq!(scan.headings[0].text, "Title");
        assert_eq!(scan.headings[1].level, 2);
        assert_eq!(scan.headings[1].text, "Usage");
        assert!(scan.blocks.is_empty());
    }

    #[test]
    fn test_scan_fenced_block_with_language() {
        let doc = "## Usage\n\n```swift\nlet x = 1\n```\n";
        let scan = scan(doc);
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.blocks[0].language.as_deref(), Some("swift"));
        assert_eq!(scan.blocks[0].body, "let x = 1");
    }

    #[test]
    fn test_scan_fenced_block_without_language() {
        let doc = "```\nplain code here\n```\n";
        let scan = scan(doc);
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.blocks[0].language, None);
    }

    #[test]
    fn test_scan_heading_inside_fence_ignored() {
        let doc = "```bash\n# 这是注释不是标题\necho hi\n```\n";
        let scan = scan(doc);
        assert!(scan.headings.is_empty());
        assert_eq!(scan.blocks.len(), 1);
    }

    #[test]
    fn test_scan_unclosed_fence() {
        let doc = "## Usage\n\n```swift\nlet x = 1\n";
        let scan = scan(doc);
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.blocks[0].body, "let x = 1");
    }

    #[test]
    fn test_scan_hash_without_space_is_not_heading() {
        let doc = "#not-a-heading\n# real heading\n";
        let scan = scan(doc);
        assert_eq!(scan.headings.len(), 1);
        assert_eq!(scan.headings[0].text, "real heading");
    }

    #[test]
    fn test_scan_trims_blank_lines_in_body() {
        let doc = "```\n\n\ncode\n\n```\n";
        let scan = scan(doc);
        assert_eq!(scan.blocks[0].body, "code");
    }
}
