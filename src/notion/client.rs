// src/notion/client.rs

//! HTTP client for the Notion REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::NotionConfig;
use crate::notion::{Block, CollectionQuery, ContentSource, Page};

/// One page of a paginated list response.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Throttled Notion API client.
pub struct NotionClient {
    http: Client,
    api_base: String,
    version: String,
    api_key: String,
    delay: Duration,
    page_size: u32,
}

impl NotionClient {
    /// Create a client. Fails when no API key is configured.
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::config("NOTION_KEY is not set"))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            api_key,
            delay: Duration::from_millis(config.request_delay_ms),
            page_size: config.page_size,
        })
    }

    /// Send a request and decode the JSON body. Sleeps the configured delay
    /// after every call, successful or not.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let result = self.send_inner(request).await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }

    async fn send_inner<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.version)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(AppError::notion(status.as_u16(), message));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Page>> {
        let url = format!("{}/databases/{}/query", self.api_base, query.database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = query.to_body(self.page_size, cursor.as_deref());
            let list: ListResponse<Page> = self.send(self.http.post(&url).json(&body)).await?;
            log::debug!(
                "Query {} returned {} pages (has_more: {})",
                query.database_id,
                list.results.len(),
                list.has_more
            );
            pages.extend(list.results);

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(pages)
    }

    async fn block_children(&self, block_id: &str) -> Result<Vec<Block>> {
        let url = format!("{}/blocks/{}/children", self.api_base, block_id);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("page_size", self.page_size.to_string())]);
            if let Some(c) = &cursor {
                request = request.query(&[("start_cursor", c)]);
            }
            let list: ListResponse<Value> = self.send(request).await?;
            blocks.extend(list.results.iter().map(Block::from_value));

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_requires_api_key() {
        let config = NotionConfig::default();
        assert!(matches!(
            NotionClient::new(&config),
            Err(AppError::Config(_))
        ));

        let config = NotionConfig {
            api_key: Some("secret_x".into()),
            api_base: "https://api.notion.com/v1/".into(),
            ..NotionConfig::default()
        };
        let client = NotionClient::new(&config).unwrap();
        assert_eq!(client.api_base, "https://api.notion.com/v1");
        assert_eq!(client.delay, Duration::from_millis(334));
    }

    #[test]
    fn list_response_tolerates_missing_cursor() {
        let list: ListResponse<Value> =
            serde_json::from_str(r#"{ "results": [], "has_more": false, "next_cursor": null }"#)
                .unwrap();
        assert!(list.results.is_empty());
        assert!(!list.has_more);
        assert!(list.next_cursor.is_none());
    }
}
