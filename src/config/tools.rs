//! Settings for the external tool adapters

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub search: SearchConfig,
    pub scrape: ScrapeConfig,
    pub files: FileWriteConfig,
    pub retrieval: RetrievalConfig,
}

/// Tavily web search
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key_env: String,
    pub max_results: u32,
    /// `basic` or `advanced`
    pub search_depth: String,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 5,
            search_depth: "basic".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Page fetching and text extraction
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Character budget for the cleaned text
    pub max_chars: usize,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_chars: 5000,
            timeout_seconds: 10,
            user_agent: concat!("aide/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Sandbox for the file-write tool
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileWriteConfig {
    /// Every written file lands under this directory
    pub sandbox_dir: PathBuf,
    /// Largest accepted payload in bytes
    pub max_bytes: usize,
}

impl Default for FileWriteConfig {
    fn default() -> Self {
        Self {
            sandbox_dir: PathBuf::from("workspace"),
            max_bytes: 1024 * 1024,
        }
    }
}

/// Vector retrieval over the document index
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Pinecone index host, e.g. `https://app-abc123.svc.us-east-1.pinecone.io`
    pub index_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub api_key_env: String,
    pub top_k: usize,
    pub timeout_seconds: u64,
    pub embedding: EmbeddingConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_host: String::new(),
            namespace: None,
            api_key_env: "PINECONE_API_KEY".to_string(),
            top_k: 5,
            timeout_seconds: 30,
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// OpenAI-compatible `/embeddings` endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Unset for local servers that need no key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key_env: None,
            dimensions: None,
        }
    }
}
