//! LLM结构化输出的标记结果类型
//!
//! 模型被要求返回JSON时，解析成功得到 `Parsed(T)`，失败则保留原文为
//! `Raw(String)`。下游消费方必须显式处理两种变体，不允许静默丢弃原文。

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// JSON解析结果：结构化数据或原始文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LlmJson<T> {
    Parsed(T),
    Raw(String),
}

impl<T> LlmJson<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, LlmJson::Parsed(_))
    }

    pub fn as_parsed(&self) -> Option<&T> {
        match self {
            LlmJson::Parsed(value) => Some(value),
            LlmJson::Raw(_) => None,
        }
    }
}

impl<T: DeserializeOwned> LlmJson<T> {
    /// 解析模型回复，失败则保留原文
    pub fn from_response(response: &str) -> Self {
        match serde_json::from_str::<T>(strip_code_fence(response)) {
            Ok(value) => LlmJson::Parsed(value),
            Err(_) => LlmJson::Raw(response.to_string()),
        }
    }

    /// 解析期望为数组的模型回复
    ///
    /// 模型偶尔会返回单个对象而不是数组，此时包装为单元素数组，与
    /// 数组解析同等对待；完全无法解析时保留原文。
    pub fn from_list_response(response: &str) -> LlmJson<Vec<T>> {
        let cleaned = strip_code_fence(response);
        if let Ok(list) = serde_json::from_str::<Vec<T>>(cleaned) {
            return LlmJson::Parsed(list);
        }
        if let Ok(single) = serde_json::from_str::<T>(cleaned) {
            return LlmJson::Parsed(vec![single]);
        }
        LlmJson::Raw(response.to_string())
    }
}

/// 去掉模型回复外层的Markdown代码围栏
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    // 围栏首行可能是语言标记（如 ```json）
    match inner.find('\n') {
        Some(pos) => inner[pos + 1..].trim(),
        None => inner.trim(),
    }
}
