use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_status, http_client, parse_args, schema_for, ToolAdapter, ToolError};
use crate::config::tools::SearchConfig;
use crate::domain::Tool;

pub const TOOL_NAME: &str = "web_search";

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Backend that turns a query into ranked hits
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, ToolError>;
}

/// Tavily search API client
pub struct TavilySearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    search_depth: String,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig, api_key: SecretString) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(config.timeout_seconds, None)?,
            endpoint: config.endpoint.clone(),
            api_key,
            search_depth: config.search_depth.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, ToolError> {
        let body = json!({
            "query": query,
            "search_depth": self.search_depth,
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let payload: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        parse_tavily_results(&payload)
    }
}

/// Extract hits from a Tavily response, skipping rows without a URL
pub fn parse_tavily_results(payload: &Value) -> Result<Vec<SearchHit>, ToolError> {
    let rows = payload
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| ToolError::Parse("missing results array".to_string()))?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let url = row.get("url").and_then(Value::as_str)?.trim();
            if url.is_empty() {
                return None;
            }
            Some(SearchHit {
                url: url.to_string(),
                title: row
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or("Untitled")
                    .to_string(),
                snippet: row
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect())
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchArgs {
    /// Search query
    query: String,
}

/// `web_search` tool
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    max_results: u32,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: u32) -> Self {
        Self {
            provider,
            max_results,
        }
    }
}

#[async_trait]
impl ToolAdapter for WebSearchTool {
    fn definition(&self) -> Tool {
        Tool {
            name: TOOL_NAME.to_string(),
            description: "Search the web and return the most relevant pages with their URLs."
                .to_string(),
            input_schema: schema_for::<SearchArgs>(),
            output_schema: None,
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: SearchArgs = parse_args(args)?;
        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("query cannot be empty".to_string()));
        }

        let mut hits = self.provider.search(query, self.max_results).await?;
        hits.truncate(self.max_results as usize);
        tracing::debug!(query, hits = hits.len(), "web search finished");

        Ok(json!({ "query": query, "results": hits }))
    }
}
