//! MCP客户端 - 研究智能体的抓取/检索协作方
//!
//! 服务端会把每次fetch/scrape的结果持久化，因此这些接口不是幂等的：
//! 对同一URL的重试会在服务端产生重复存储行。调用方须把所有接口视为
//! 可失败操作。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::McpConfig;

/// MCP传输层错误
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("请求MCP服务失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("MCP服务返回异常状态 {status}: {body}")]
    Status { status: u16, body: String },
}

/// fetch接口响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub stored: bool,
}

/// scrape接口响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub extracted_data: Value,
    #[serde(default)]
    pub stored: bool,
}

/// db/search接口响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub count: usize,
}

/// 研究协作方接口
///
/// 生产实现为[`McpClient`]，测试中可注入脚本化的替身。
#[async_trait]
pub trait McpCollaborator: Send + Sync {
    async fn fetch_url(
        &self,
        url: &str,
        headers: Option<HashMap<String, String>>,
        timeout_secs: u64,
    ) -> Result<FetchResponse, McpError>;

    async fn scrape_url(
        &self,
        url: &str,
        selectors: Option<HashMap<String, String>>,
        extract_links: bool,
        extract_images: bool,
    ) -> Result<ScrapeResponse, McpError>;

    async fn search_data(
        &self,
        table: &str,
        search_term: &str,
        limit: usize,
    ) -> Result<SearchResponse, McpError>;

    async fn health_check(&self) -> Result<Value, McpError>;
}

/// MCP HTTP客户端
pub struct McpClient {
    base_url: String,
    client: reqwest::Client,
}

impl McpClient {
    pub fn new(config: &McpConfig) -> Result<Self, McpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post_json<T>(&self, path: &str, payload: &Value) -> Result<T, McpError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(payload)
            .send()
            .await?;

        Self::into_body(response).await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, McpError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        Self::into_body(response).await
    }

    async fn into_body<T>(response: reqwest::Response) -> Result<T, McpError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl McpCollaborator for McpClient {
    /// 获取URL原始内容并存储
    async fn fetch_url(
        &self,
        url: &str,
        headers: Option<HashMap<String, String>>,
        timeout_secs: u64,
    ) -> Result<FetchResponse, McpError> {
        let mut payload = serde_json::json!({
            "url": url,
            "timeout": timeout_secs,
        });
        if let Some(headers) = headers {
            payload["headers"] = serde_json::to_value(headers).unwrap_or_default();
        }

        self.post_json("/fetch", &payload).await
    }

    /// 抓取并解析URL内容
    async fn scrape_url(
        &self,
        url: &str,
        selectors: Option<HashMap<String, String>>,
        extract_links: bool,
        extract_images: bool,
    ) -> Result<ScrapeResponse, McpError> {
        let mut payload = serde_json::json!({
            "url": url,
            "extract_links": extract_links,
            "extract_images": extract_images,
        });
        if let Some(selectors) = selectors {
            payload["selectors"] = serde_json::to_value(selectors).unwrap_or_default();
        }

        self.post_json("/scrape", &payload).await
    }

    /// 在已存数据表中检索
    async fn search_data(
        &self,
        table: &str,
        search_term: &str,
        limit: usize,
    ) -> Result<SearchResponse, McpError> {
        let payload = serde_json::json!({
            "table": table,
            "search_term": search_term,
            "limit": limit,
        });

        self.post_json("/db/search", &payload).await
    }

    /// 服务健康检查
    async fn health_check(&self) -> Result<Value, McpError> {
        self.get_json("/health").await
    }
}

/// 同时检索fetched与scraped两张表并合并结果
pub async fn search_stored_data(
    mcp: &dyn McpCollaborator,
    search_term: &str,
    limit: usize,
) -> Result<(Vec<Value>, Vec<Value>), McpError> {
    let fetched = mcp.search_data("fetched_data", search_term, limit).await?;
    let scraped = mcp.search_data("scraped_data", search_term, limit).await?;
    Ok((fetched.results, scraped.results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(url: &str) -> McpConfig {
        McpConfig {
            base_url: url.to_string(),
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_fetch_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/fetch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 7, "url": "http://example.com", "content": "hello", "metadata": {}, "stored": true}"#,
            )
            .create_async()
            .await;

        let client = McpClient::new(&config_for(&server.url())).unwrap();
        let response = client
            .fetch_url("http://example.com", None, 30)
            .await
            .unwrap();

        assert_eq!(response.id, Some(7));
        assert_eq!(response.content, "hello");
        assert!(response.stored);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_scrape_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/scrape")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 1, "url": "http://example.com/page", "title": "Page", "content": "body", "extracted_data": {"links": []}, "stored": true}"#,
            )
            .create_async()
            .await;

        let client = McpClient::new(&config_for(&server.url())).unwrap();
        let response = client
            .scrape_url("http://example.com/page", None, true, true)
            .await
            .unwrap();

        assert_eq!(response.title, "Page");
        assert_eq!(response.content, "body");
    }

    #[tokio::test]
    async fn test_search_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [{"id": 1}, {"id": 2}], "count": 2}"#)
            .create_async()
            .await;

        let client = McpClient::new(&config_for(&server.url())).unwrap();
        let response = client.search_data("fetched_data", "ai", 3).await.unwrap();

        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "healthy"}"#)
            .create_async()
            .await;

        let client = McpClient::new(&config_for(&server.url())).unwrap();
        let health = client.health_check().await.unwrap();
        assert_eq!(health["status"], "healthy");
    }

    #[tokio::test]
    async fn test_error_status_mapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/fetch")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = McpClient::new(&config_for(&server.url())).unwrap();
        let result = client.fetch_url("http://example.com", None, 30).await;

        match result {
            Err(McpError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("internal error"));
            }
            other => panic!("期望Status错误，实际为 {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_search_stored_data_merges_tables() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [{"id": 1}], "count": 1}"#)
            .expect(2)
            .create_async()
            .await;

        let client = McpClient::new(&config_for(&server.url())).unwrap();
        let (fetched, scraped) = search_stored_data(&client, "term", 3).await.unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(scraped.len(), 1);
    }
}
