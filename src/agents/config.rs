//! Configuration types for the supervisor, the workers and the dispatcher

use serde::{Deserialize, Serialize};

use super::core::prompts;
use super::domain::WorkerKind;

/// Configuration for one worker agent
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Specialization shown to the supervisor
    pub description: String,
    /// System prompt for the worker
    #[serde(default)]
    pub system_prompt: String,
    /// LLM override; the top-level `llm` section is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmProviderConfig>,
    /// Tool names from the tool registry
    #[serde(default)]
    pub tools: Vec<String>,
    /// Maximum model turns in the tool loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Wall-clock budget for one worker run
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Temperature override (if not set, uses LLM config default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Max tokens override (if not set, uses LLM config default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_max_iterations() -> u32 {
    10
}

fn default_timeout() -> u64 {
    120
}

impl AgentConfig {
    /// Provider settings for this worker, falling back to the shared one
    pub fn llm_or<'a>(&'a self, fallback: &'a LlmProviderConfig) -> &'a LlmProviderConfig {
        self.llm.as_ref().unwrap_or(fallback)
    }

    pub fn researcher() -> Self {
        Self {
            description: "Searches the web, reads pages and can save notes to files. \
                          Use for current events and questions that need online sources."
                .to_string(),
            system_prompt: prompts::RESEARCHER_PROMPT.to_string(),
            llm: None,
            tools: vec![
                "web_search".to_string(),
                "scrape_url".to_string(),
                "write_file".to_string(),
            ],
            max_iterations: default_max_iterations(),
            timeout_seconds: default_timeout(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn vision_agent() -> Self {
        Self {
            description: "Analyzes the image attached to the request and answers questions about it."
                .to_string(),
            system_prompt: prompts::VISION_PROMPT.to_string(),
            llm: Some(LlmProviderConfig {
                model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
                temperature: Some(0.7),
                ..LlmProviderConfig::default()
            }),
            tools: Vec::new(),
            max_iterations: 1,
            timeout_seconds: default_timeout(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn rag_agent() -> Self {
        Self {
            description: "Answers from the uploaded document collection using vector retrieval."
                .to_string(),
            system_prompt: prompts::RAG_PROMPT.to_string(),
            llm: None,
            tools: vec!["retrieve_documents".to_string()],
            max_iterations: 5,
            timeout_seconds: default_timeout(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Per-worker settings, one entry for each route label
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkersConfig {
    pub researcher: AgentConfig,
    pub vision_agent: AgentConfig,
    pub rag_agent: AgentConfig,
}

impl WorkersConfig {
    pub fn get(&self, kind: WorkerKind) -> &AgentConfig {
        match kind {
            WorkerKind::Researcher => &self.researcher,
            WorkerKind::VisionAgent => &self.vision_agent,
            WorkerKind::RagAgent => &self.rag_agent,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerKind, &AgentConfig)> {
        WorkerKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            researcher: AgentConfig::researcher(),
            vision_agent: AgentConfig::vision_agent(),
            rag_agent: AgentConfig::rag_agent(),
        }
    }
}

/// Supervisor settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SupervisorConfig {
    /// LLM override; the top-level `llm` section is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmProviderConfig>,
    /// Tera template replacing the built-in routing instruction.
    /// Receives `workers` (name, description) and `options`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            llm: None,
            system_prompt: None,
            temperature: Some(0.0),
        }
    }
}

/// LLM provider configuration
///
/// Every field has a default so partial overrides in config files are valid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmProviderConfig {
    pub provider: LlmProviderType,
    /// Model name/identifier
    pub model: String,
    /// Environment variable containing the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Endpoint root, e.g. `https://api.groq.com/openai/v1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// HTTP timeout for a single completion call
    pub timeout_seconds: u64,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderType::OpenAI,
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: Some("GROQ_API_KEY".to_string()),
            base_url: Some("https://api.groq.com/openai/v1".to_string()),
            temperature: Some(0.0),
            max_tokens: None,
            timeout_seconds: 60,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Any OpenAI-compatible chat completions API (OpenAI, Groq, vLLM, ...)
    #[default]
    #[serde(alias = "groq")]
    OpenAI,
}

impl std::fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderType::OpenAI => write!(f, "openai"),
        }
    }
}

/// How the dispatcher continues after a worker reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Supervisor, one worker, done
    #[default]
    OneShot,
    /// Return to the supervisor after each worker, up to `max_steps` workers
    Bounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub mode: DispatchMode,
    /// Worker runs allowed per request in bounded mode
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

fn default_max_steps() -> u32 {
    3
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::OneShot,
            max_steps: default_max_steps(),
        }
    }
}

impl DispatchConfig {
    pub fn bounded(max_steps: u32) -> Self {
        Self {
            mode: DispatchMode::Bounded,
            max_steps,
        }
    }
}
