//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::config::{AgentConfig, LLMConfig};

mod providers;

use providers::ProviderClient;

/// LLM协作方接口 - 智能体对模型调用的唯一依赖
///
/// 生产实现为[`LLMClient`]，测试中可注入脚本化的替身。
#[async_trait]
pub trait LlmCollaborator: Send + Sync {
    /// 给定系统提示词与用户提示词，返回生成文本
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &LLMConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts,
            backoff: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    model: String,
    temperature: f64,
    retry: RetryPolicy,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端，使用配置中的默认模型与温度
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(config)?;
        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            retry: RetryPolicy::from_config(config),
            client,
            config: config.clone(),
        })
    }

    /// 为指定智能体创建客户端，应用其模型与温度覆盖
    pub fn for_agent(config: &LLMConfig, agent: &AgentConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        if let Some(model) = &agent.model {
            client.model = model.clone();
        }
        client.temperature = agent.temperature;
        Ok(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self.prompt("You are a helpful assistant.", "Hello").await {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    attempts += 1;
                    eprintln!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        attempts, max_attempts, err
                    );
                    if attempts >= max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(self.retry.backoff).await;
                }
            }
        }
    }

    /// 单轮对话方法
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let agent =
            self.client
                .create_agent(&self.model, system_prompt, self.temperature, &self.config);

        self.retry_with_backoff(|| async { agent.prompt(user_prompt).await })
            .await
    }
}

#[async_trait]
impl LlmCollaborator for LLMClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompt(system_prompt, user_prompt).await
    }
}
