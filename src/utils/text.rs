//! 文本处理工具 - 截断与条目解析

/// 按字符数截断文本，保证不落在UTF-8字符中间
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// 从LLM的自由文本回复中解析条目列表
///
/// 识别三类行：
/// - 以 `-`、`•`、`*` 开头的列表项（去掉标记）
/// - 以 `1.`、`2.` 等序号开头的列表项（去掉序号）
/// - 长度超过 `min_plain_len` 且不以冒号结尾的普通句子
pub fn parse_bullet_lines(text: &str, min_plain_len: usize, limit: usize) -> Vec<String> {
    let mut items = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(stripped) = strip_bullet_marker(line) {
            if !stripped.is_empty() {
                items.push(stripped.to_string());
            }
        } else if line.len() > min_plain_len && !line.ends_with(':') && !line.ends_with('：') {
            items.push(line.to_string());
        }

        if items.len() >= limit {
            break;
        }
    }

    items.truncate(limit);
    items
}

/// 去掉行首的列表标记，返回剩余内容；不是列表项则返回None
fn strip_bullet_marker(line: &str) -> Option<&str> {
    for marker in ['-', '•', '*'] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }

    // 序号形式："1. xxx" / "12. xxx"
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.') {
            return Some(rest.trim());
        }
    }

    None
}
