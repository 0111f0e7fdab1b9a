use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_status, http_client, parse_args, schema_for, ToolAdapter, ToolError};
use crate::config::tools::{EmbeddingConfig, RetrievalConfig};
use crate::domain::Tool;

pub const TOOL_NAME: &str = "retrieve_documents";

/// Turns text into a query vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError>;
}

/// Nearest-neighbour lookup over stored chunks
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Best matches first
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredSnippet>, ToolError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSnippet {
    pub score: f32,
    pub text: String,
}

/// OpenAI-compatible `/embeddings` client
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dimensions: Option<u32>,
    api_key: Option<SecretString>,
}

impl OpenAiEmbedder {
    pub fn new(
        config: &EmbeddingConfig,
        api_key: Option<SecretString>,
        timeout_seconds: u64,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(timeout_seconds, None)?,
            url: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError> {
        let mut body = json!({ "model": self.model, "input": [text] });
        if let Some(dimensions) = self.dimensions {
            body["dimensions"] = json!(dimensions);
        }

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }
        let payload: EmbeddingResponse = check_status(request.send().await?)
            .await?
            .json()
            .await
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        payload
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| ToolError::Parse("embedding response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Pinecone data-plane client for one index host
pub struct PineconeIndex {
    client: reqwest::Client,
    url: String,
    namespace: Option<String>,
    api_key: SecretString,
}

impl PineconeIndex {
    pub fn new(config: &RetrievalConfig, api_key: SecretString) -> Result<Self, ToolError> {
        let host = config.index_host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        Ok(Self {
            client: http_client(config.timeout_seconds, None)?,
            url: format!("{}/query", base),
            namespace: config.namespace.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredSnippet>, ToolError> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false
        });
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response = self
            .client
            .post(&self.url)
            .header("Api-Key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let payload: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        parse_pinecone_matches(&payload)
    }
}

/// Snippets from a Pinecone query response, taken from `metadata.text`
pub fn parse_pinecone_matches(payload: &Value) -> Result<Vec<ScoredSnippet>, ToolError> {
    let matches = payload
        .get("matches")
        .and_then(Value::as_array)
        .ok_or_else(|| ToolError::Parse("missing matches array".to_string()))?;

    Ok(matches
        .iter()
        .map(|m| ScoredSnippet {
            score: m.get("score").and_then(Value::as_f64).unwrap_or_default() as f32,
            text: m
                .pointer("/metadata/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect())
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RetrieveArgs {
    /// Natural-language question to look up in the document collection
    query: String,
}

/// `retrieve_documents` tool
pub struct RetrievalTool {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl RetrievalTool {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }
}

#[async_trait]
impl ToolAdapter for RetrievalTool {
    fn definition(&self) -> Tool {
        Tool {
            name: TOOL_NAME.to_string(),
            description: "Look up passages relevant to a query in the uploaded document collection."
                .to_string(),
            input_schema: schema_for::<RetrieveArgs>(),
            output_schema: None,
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: RetrieveArgs = parse_args(args)?;
        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("query cannot be empty".to_string()));
        }

        let vector = self.embedder.embed(query).await?;
        let mut snippets = self.index.query(vector, self.top_k).await?;
        snippets.truncate(self.top_k);

        let documents: Vec<Value> = snippets
            .into_iter()
            .enumerate()
            .map(|(i, s)| json!({ "rank": i + 1, "score": s.score, "text": s.text }))
            .collect();
        tracing::debug!(query, documents = documents.len(), "retrieval finished");

        Ok(json!({ "query": query, "documents": documents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        seen: Mutex<Vec<(Vec<f32>, usize)>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredSnippet>, ToolError> {
            self.seen.lock().unwrap().push((vector, top_k));
            Ok((0..7)
                .map(|i| ScoredSnippet {
                    score: 1.0 - i as f32 / 10.0,
                    text: format!("chunk {i}"),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn returns_ranked_snippets_capped_at_top_k() {
        let index = Arc::new(RecordingIndex::default());
        let tool = RetrievalTool::new(Arc::new(FixedEmbedder), index.clone(), 5);

        let output = tool.call(json!({"query": "refund policy"})).await.unwrap();
        let docs = output["documents"].as_array().unwrap();

        assert_eq!(docs.len(), 5);
        assert_eq!(docs[0]["rank"], 1);
        assert_eq!(docs[0]["text"], "chunk 0");
        assert_eq!(docs[4]["rank"], 5);
        assert_eq!(index.seen.lock().unwrap()[0], (vec![13.0, 1.0], 5));
    }

    #[test]
    fn parses_pinecone_matches() {
        let payload = json!({
            "matches": [
                {"id": "a", "score": 0.91, "metadata": {"text": "Refunds take 5 days."}},
                {"id": "b", "score": 0.42}
            ],
            "namespace": ""
        });
        let snippets = parse_pinecone_matches(&payload).unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "Refunds take 5 days.");
        assert_eq!(snippets[1].text, "");
    }

    #[test]
    fn bare_host_gets_https_scheme() {
        let config = RetrievalConfig {
            index_host: "app-123.svc.pinecone.io/".to_string(),
            ..RetrievalConfig::default()
        };
        let index = PineconeIndex::new(&config, SecretString::from("pc-key".to_string())).unwrap();
        assert_eq!(index.url, "https://app-123.svc.pinecone.io/query");
    }
}
