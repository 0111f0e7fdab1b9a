#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aide::adapters::tool_handler::ToolRegistry;
use aide::adapters::tools::{SearchHit, SearchProvider, ToolError, WebSearchTool};
use aide::agents::core::prompts::RosterEntry;
use aide::agents::core::{create_worker, WorkerSettings};
use aide::agents::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use aide::agents::orchestration::{Dispatcher, Supervisor};
use aide::agents::{
    AgentConfig, AgentInfo, ChatService, DispatchConfig, LlmError, LlmResult, Message, ToolCall,
    WorkerKind, WorkersConfig,
};
use async_trait::async_trait;
use serde_json::{json, Value};

/// LLM double that replays queued replies and records requests
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn text(self: &Arc<Self>, content: &str) -> Arc<Self> {
        self.push(Message::assistant(content), FinishReason::Stop)
    }

    pub fn tool_call(self: &Arc<Self>, name: &str, arguments: Value) -> Arc<Self> {
        let call = ToolCall::new(ToolCall::generate_id(), name, arguments);
        self.push(
            Message::assistant_with_tools("", vec![call]),
            FinishReason::ToolCalls,
        )
    }

    pub fn route(self: &Arc<Self>, label: &str) -> Arc<Self> {
        self.tool_call("route", json!({ "next": label }))
    }

    fn push(self: &Arc<Self>, message: Message, finish_reason: FinishReason) -> Arc<Self> {
        self.replies.lock().unwrap().push_back(CompletionResponse {
            message,
            finish_reason,
            usage: None,
        });
        self.clone()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidRequest("script exhausted".to_string()))
    }
}

/// Search backend returning fixed hits
pub struct StaticSearch(pub Vec<SearchHit>);

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, max_results: u32) -> Result<Vec<SearchHit>, ToolError> {
        Ok(self.0.iter().take(max_results as usize).cloned().collect())
    }
}

pub fn hit(url: &str, title: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        snippet: format!("About {}", title),
    }
}

/// Scripted LLMs for the supervisor and each worker
pub struct Scripts {
    pub supervisor: Arc<ScriptedLlm>,
    pub researcher: Arc<ScriptedLlm>,
    pub vision: Arc<ScriptedLlm>,
    pub rag: Arc<ScriptedLlm>,
}

impl Default for Scripts {
    fn default() -> Self {
        Self {
            supervisor: ScriptedLlm::new(),
            researcher: ScriptedLlm::new(),
            vision: ScriptedLlm::new(),
            rag: ScriptedLlm::new(),
        }
    }
}

fn settings(config: &AgentConfig) -> WorkerSettings {
    WorkerSettings {
        max_iterations: config.max_iterations,
        timeout: Duration::from_secs(5),
        temperature: config.temperature,
        max_tokens: None,
    }
}

/// Chat service wired to scripted models; the researcher gets a real
/// `web_search` tool over [`StaticSearch`]
pub fn chat_service(scripts: &Scripts, dispatch: DispatchConfig) -> ChatService {
    let workers = WorkersConfig::default();
    let roster: Vec<RosterEntry> = workers
        .iter()
        .map(|(kind, config)| RosterEntry {
            name: kind.as_str().to_string(),
            description: config.description.clone(),
        })
        .collect();

    let supervisor = Supervisor::new(scripts.supervisor.clone(), &roster, None, Some(0.0)).unwrap();

    let search = StaticSearch(vec![
        hit("https://blog.rust-lang.org/2024/rust-1.80", "Rust 1.80"),
        hit("https://doc.rust-lang.org/edition-guide", "Edition guide"),
    ]);
    let research_tools = ToolRegistry::new().with(Arc::new(WebSearchTool::new(Arc::new(search), 5)));

    let mut dispatcher = Dispatcher::new(supervisor, dispatch);
    let mut infos = Vec::new();
    for (kind, config) in workers.iter() {
        let (llm, tools): (Arc<dyn LlmProvider>, ToolRegistry) = match kind {
            WorkerKind::Researcher => (scripts.researcher.clone(), research_tools.clone()),
            WorkerKind::VisionAgent => (scripts.vision.clone(), ToolRegistry::new()),
            WorkerKind::RagAgent => (scripts.rag.clone(), ToolRegistry::new()),
        };
        dispatcher.register(create_worker(kind, config, settings(config), llm, Arc::new(tools)));
        infos.push(AgentInfo {
            name: kind,
            description: config.description.clone(),
            available_tools: config.tools.clone(),
            llm_provider: "scripted".to_string(),
            llm_model: "scripted-model".to_string(),
        });
    }

    ChatService::new(dispatcher, infos)
}
