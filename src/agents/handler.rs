//! Chat service: builds the dispatcher from settings and serves chat requests

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::secrets::Secrets;
use crate::adapters::tool_handler::ToolRegistry;
use crate::adapters::tools::{
    file_write, retrieval, scrape, web_search, FileWriteTool, OpenAiEmbedder, PineconeIndex,
    RetrievalTool, ScrapeTool, TavilySearch, WebSearchTool,
};
use crate::agents::config::LlmProviderConfig;
use crate::agents::core::prompts::RosterEntry;
use crate::agents::core::{create_worker, WorkerSettings};
use crate::agents::domain::{AgentInfo, ConversationState, ImageSource, Route, WorkerKind};
use crate::agents::error::{AgentError, AgentResult, DispatchError};
use crate::agents::llm::{create_provider, LlmProvider};
use crate::agents::orchestration::{Dispatcher, Supervisor};
use crate::config::tools::ToolsConfig;
use crate::config::Settings;

/// One chat turn as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageSource) -> Self {
        self.image = Some(image);
        self
    }
}

/// What the client gets back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub request_id: Uuid,
    /// Last worker reply; empty when the supervisor finished without delegating
    pub content: String,
    /// Final routing label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    /// Every routing label of the run, in order
    pub trace: Vec<Route>,
    /// Worker that wrote `content`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_by: Option<String>,
    /// URLs surfaced by web search during the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    pub elapsed_ms: i64,
}

/// Entry point for chat requests
pub struct ChatService {
    dispatcher: Dispatcher,
    roster: Vec<AgentInfo>,
}

impl ChatService {
    pub fn new(dispatcher: Dispatcher, roster: Vec<AgentInfo>) -> Self {
        Self { dispatcher, roster }
    }

    /// Build every provider, tool and worker once from the loaded settings.
    ///
    /// Missing credentials for a configured worker fail here, not on first use.
    pub fn from_settings(settings: &Settings, secrets: &Secrets) -> AgentResult<Self> {
        let mut providers = ProviderCache::default();

        let tools = build_tool_registry(settings, secrets)?;

        let roster_entries: Vec<RosterEntry> = settings
            .agents
            .iter()
            .map(|(kind, config)| RosterEntry {
                name: kind.as_str().to_string(),
                description: config.description.clone(),
            })
            .collect();

        let supervisor_llm_config = settings.supervisor.llm.as_ref().unwrap_or(&settings.llm);
        let supervisor = Supervisor::new(
            providers.get(supervisor_llm_config, secrets)?,
            &roster_entries,
            settings.supervisor.system_prompt.as_deref(),
            settings.supervisor.temperature.or(supervisor_llm_config.temperature),
        )?;

        let mut dispatcher = Dispatcher::new(supervisor, settings.dispatch);
        let mut roster = Vec::new();

        for (kind, config) in settings.agents.iter() {
            let llm_config = config.llm_or(&settings.llm);
            let llm = providers.get(llm_config, secrets)?;
            let worker_tools = tools
                .restricted(&config.tools)
                .map_err(|e| AgentError::Configuration(format!("{}: {}", kind, e)))?;

            dispatcher.register(create_worker(
                kind,
                config,
                WorkerSettings::resolve(config, llm_config),
                llm.clone(),
                Arc::new(worker_tools),
            ));
            roster.push(AgentInfo {
                name: kind,
                description: config.description.clone(),
                available_tools: config.tools.clone(),
                llm_provider: llm.name().to_string(),
                llm_model: llm.model().to_string(),
            });
            tracing::info!(worker = %kind, model = llm.model(), tools = ?config.tools, "worker ready");
        }

        Ok(Self::new(dispatcher, roster))
    }

    /// Registered workers, in route-label order
    pub fn agents(&self) -> &[AgentInfo] {
        &self.roster
    }

    pub fn has_worker(&self, kind: WorkerKind) -> bool {
        self.dispatcher.workers().any(|k| k == kind)
    }

    /// Run one chat turn through the supervisor and at most the configured
    /// number of workers.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, DispatchError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(DispatchError::EmptyConversation);
        }

        let mut state = ConversationState::from_query(query);
        if let Some(image) = request.image {
            state = state.with_image(image);
        }
        let request_id = state.request_id;
        let started_at = state.started_at;
        tracing::info!(%request_id, has_image = state.image.is_some(), "chat request");

        let outcome = self.dispatcher.run(state).await?;

        let (content, answered_by) = match outcome.reply {
            Some(message) => (message.content, message.name),
            None => (String::new(), None),
        };

        Ok(ChatReply {
            request_id,
            content,
            route: outcome.state.next,
            trace: outcome.trace,
            answered_by,
            sources: outcome.state.urls_found,
            elapsed_ms: (chrono::Utc::now() - started_at).num_milliseconds(),
        })
    }
}

/// Shares one client between workers that use the same endpoint and model
#[derive(Default)]
struct ProviderCache {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderCache {
    fn get(&mut self, config: &LlmProviderConfig, secrets: &Secrets) -> AgentResult<Arc<dyn LlmProvider>> {
        let key = format!(
            "{}|{}|{}|{}",
            config.provider,
            config.base_url.as_deref().unwrap_or_default(),
            config.model,
            config.api_key_env.as_deref().unwrap_or_default()
        );
        if let Some(provider) = self.providers.get(&key) {
            return Ok(provider.clone());
        }
        let provider = create_provider(config, secrets).map_err(|e| {
            AgentError::Configuration(format!("LLM provider for model {}: {}", config.model, e))
        })?;
        self.providers.insert(key, provider.clone());
        Ok(provider)
    }
}

fn config_err(e: impl std::fmt::Display) -> AgentError {
    AgentError::Configuration(e.to_string())
}

/// Register the adapters that at least one worker asks for
fn build_tool_registry(settings: &Settings, secrets: &Secrets) -> AgentResult<ToolRegistry> {
    let wanted = |name: &str| settings.agents.iter().any(|(_, c)| c.tools.iter().any(|t| t == name));
    let tools: &ToolsConfig = &settings.tools;
    let mut registry = ToolRegistry::new();

    if wanted(web_search::TOOL_NAME) {
        let key = secrets.require(&tools.search.api_key_env).map_err(config_err)?;
        let provider = TavilySearch::new(&tools.search, key).map_err(config_err)?;
        registry.register(Arc::new(WebSearchTool::new(
            Arc::new(provider),
            tools.search.max_results,
        )));
    }

    if wanted(scrape::TOOL_NAME) {
        registry.register(Arc::new(ScrapeTool::new(&tools.scrape).map_err(config_err)?));
    }

    if wanted(file_write::TOOL_NAME) {
        registry.register(Arc::new(FileWriteTool::new(&tools.files)));
    }

    if wanted(retrieval::TOOL_NAME) {
        let config = &tools.retrieval;
        let index_key = secrets.require(&config.api_key_env).map_err(config_err)?;
        let embed_key = match &config.embedding.api_key_env {
            Some(name) => Some(secrets.require(name).map_err(config_err)?),
            None => None,
        };
        let embedder = OpenAiEmbedder::new(&config.embedding, embed_key, config.timeout_seconds)
            .map_err(config_err)?;
        let index = PineconeIndex::new(config, index_key).map_err(config_err)?;
        registry.register(Arc::new(RetrievalTool::new(
            Arc::new(embedder),
            Arc::new(index),
            config.top_k,
        )));
    }

    tracing::debug!(tools = ?registry.names(), "tool registry built");
    Ok(registry)
}
