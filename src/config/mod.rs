use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// MCP服务配置
    pub mcp: McpConfig,

    /// 编排器配置
    pub orchestrator: OrchestratorConfig,

    /// 研究智能体配置
    pub research_agent: AgentConfig,

    /// 分析智能体配置
    pub analysis_agent: AgentConfig,

    /// 行动智能体配置
    pub action_agent: AgentConfig,

    /// 研究结果缓存配置
    pub cache: CacheConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 默认模型，各智能体可单独覆盖
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 默认温度，各智能体可单独覆盖
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// MCP服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct McpConfig {
    /// MCP服务基地址
    pub base_url: String,

    /// 请求超时时间（秒）
    pub timeout_seconds: u64,
}

/// 编排器配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// 工作流级别的重试预算，三个智能体共享
    pub max_retries: u32,

    /// 执行历史保留条数上限，超出淘汰最旧记录
    pub history_capacity: usize,
}

/// 单个智能体配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// 智能体名称
    pub name: String,

    /// 使用的模型，缺省继承LLM默认模型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// 温度
    pub temperature: f64,
}

/// 缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,

    /// 缓存条目数上限，超出淘汰最旧条目
    pub capacity: usize,

    /// 缓存过期时间（小时）
    pub expire_hours: u64,
}

/// 配置校验结果 - 以数据形式返回，不抛异常
#[derive(Debug, Clone, Serialize, Default)]
pub struct ConfigIssues {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigIssues {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 序列化为TOML文本，用于`config --create`与`config --show`
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// 校验配置，返回问题列表
    pub fn validate(&self) -> ConfigIssues {
        let mut issues = ConfigIssues::default();

        if self.llm.api_key.trim().is_empty() && self.llm.provider != LLMProvider::Ollama {
            issues.errors.push("LLM API key is required".to_string());
        }

        if !self.mcp.base_url.starts_with("http://") && !self.mcp.base_url.starts_with("https://") {
            issues
                .errors
                .push("MCP server URL must start with http:// or https://".to_string());
        }

        for agent in [
            &self.research_agent,
            &self.analysis_agent,
            &self.action_agent,
        ] {
            if !(0.0..=2.0).contains(&agent.temperature) {
                issues.warnings.push(format!(
                    "{} temperature outside recommended range (0-2)",
                    agent.name
                ));
            }
        }

        if self.orchestrator.max_retries > 10 {
            issues
                .warnings
                .push("max_retries above 10 will make failing workflows very slow".to_string());
        }

        issues
    }

    /// 按名称取智能体配置
    pub fn agent_config(&self, name: &str) -> Option<&AgentConfig> {
        match name.to_lowercase().as_str() {
            "research" => Some(&self.research_agent),
            "analysis" => Some(&self.analysis_agent),
            "action" => Some(&self.action_agent),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            mcp: McpConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            research_agent: AgentConfig::research_default(),
            analysis_agent: AgentConfig::analysis_default(),
            action_agent: AgentConfig::action_default(),
            cache: CacheConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("TRIAD_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model: String::from("gpt-4o"),
            max_tokens: 4096,
            temperature: 0.7,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 60,
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8000"),
            timeout_seconds: 30,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            history_capacity: 256,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: String::from("Agent"),
            model: None,
            temperature: 0.7,
        }
    }
}

impl AgentConfig {
    /// 研究智能体默认配置 - 较低温度保证检索聚焦
    pub fn research_default() -> Self {
        Self {
            name: String::from("Research Agent"),
            model: None,
            temperature: 0.3,
        }
    }

    /// 分析智能体默认配置
    pub fn analysis_default() -> Self {
        Self {
            name: String::from("Analysis Agent"),
            model: None,
            temperature: 0.5,
        }
    }

    /// 行动智能体默认配置
    pub fn action_default() -> Self {
        Self {
            name: String::from("Action Agent"),
            model: None,
            temperature: 0.4,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 128,
            expire_hours: 24,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
