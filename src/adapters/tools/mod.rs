//! Tool adapters used by the workers
//!
//! Each adapter wraps one external capability behind [`ToolAdapter`]:
//! - `web_search` - Tavily search, ranked result records
//! - `scrape_url` - fetch a page and reduce it to readable text
//! - `write_file` - write text into the sandbox directory
//! - `retrieve_documents` - embed a query and look it up in the vector index
//!
//! Adapters are stateless per call and never retry.

pub mod file_write;
pub mod retrieval;
pub mod scrape;
pub mod web_search;

pub use file_write::FileWriteTool;
pub use retrieval::{Embedder, OpenAiEmbedder, PineconeIndex, RetrievalTool, ScoredSnippet, VectorIndex};
pub use scrape::ScrapeTool;
pub use web_search::{SearchHit, SearchProvider, TavilySearch, WebSearchTool};

use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::Tool;

/// Errors a tool call can produce. They are reported back to the model
/// as tool messages and never abort a worker.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Path rejected: {0}")]
    PathRejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ToolError::Request(format!("timed out: {}", err))
        } else {
            ToolError::Request(err.to_string())
        }
    }
}

/// One callable tool
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Name, description and argument schema
    fn definition(&self) -> Tool;

    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// Deserialize tool arguments into their typed form
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Inline JSON Schema for an argument struct, without the meta keys
/// function-calling APIs reject.
pub fn schema_for<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator()
        .into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("title");
        obj.remove("definitions");
    }
    value
}

/// Build a `reqwest` client with a per-request timeout
pub(crate) fn http_client(timeout_seconds: u64, user_agent: Option<&str>) -> Result<reqwest::Client, ToolError> {
    let mut builder = reqwest::Client::builder().timeout(std::time::Duration::from_secs(timeout_seconds));
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    builder
        .build()
        .map_err(|e| ToolError::Request(format!("failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into [`ToolError::Upstream`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ToolError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}
