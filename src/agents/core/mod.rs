//! Worker implementations
//!
//! - `ResearcherWorker`: tool loop over web search, scraping and file writes
//! - `VisionWorker`: one multimodal completion over the request image
//! - `RagWorker`: tool loop over vector retrieval

pub mod prompts;
mod rag;
mod react;
mod researcher;
mod vision;

pub use rag::RagWorker;
pub use react::{ReActLoop, ReActOutcome};
pub use researcher::ResearcherWorker;
pub use vision::VisionWorker;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::agents::config::{AgentConfig, LlmProviderConfig};
use crate::agents::domain::{ConversationState, Message, StateUpdate, WorkerKind};
use crate::agents::error::AgentResult;
use crate::agents::llm::LlmProvider;
use crate::domain::ToolPort;

/// What a worker hands back to the dispatcher
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    /// Reply appended to the conversation, named after the worker
    pub message: Message,
    pub update: StateUpdate,
}

impl WorkerOutput {
    pub fn reply(kind: WorkerKind, content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content).with_name(kind.as_str()),
            update: StateUpdate::default(),
        }
    }

    pub fn with_update(mut self, update: StateUpdate) -> Self {
        self.update = update;
        self
    }
}

/// A specialist the supervisor can route to
#[async_trait]
pub trait Worker: Send + Sync {
    fn kind(&self) -> WorkerKind;

    /// Wall-clock budget for one run
    fn timeout(&self) -> Duration;

    /// Act on the current state. The state is read-only; changes travel
    /// back through [`WorkerOutput`].
    async fn run(&self, state: &ConversationState) -> AgentResult<WorkerOutput>;
}

/// Sampling and budget settings resolved from the worker and provider config
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub max_iterations: u32,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl WorkerSettings {
    pub fn resolve(config: &AgentConfig, llm: &LlmProviderConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            timeout: Duration::from_secs(config.timeout_seconds),
            temperature: config.temperature.or(llm.temperature),
            max_tokens: config.max_tokens.or(llm.max_tokens),
        }
    }
}

/// Build the worker for `kind`. `tools` must already be restricted to the
/// worker's own toolset.
pub fn create_worker(
    kind: WorkerKind,
    config: &AgentConfig,
    settings: WorkerSettings,
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolPort>,
) -> Arc<dyn Worker> {
    match kind {
        WorkerKind::Researcher => Arc::new(ResearcherWorker::new(
            ReActLoop::new(llm, tools, &config.system_prompt, settings.max_iterations)
                .with_sampling(settings.temperature, settings.max_tokens),
            settings.timeout,
        )),
        WorkerKind::VisionAgent => Arc::new(VisionWorker::new(
            llm,
            &config.system_prompt,
            settings,
        )),
        WorkerKind::RagAgent => Arc::new(RagWorker::new(
            ReActLoop::new(llm, tools, &config.system_prompt, settings.max_iterations)
                .with_sampling(settings.temperature, settings.max_tokens),
            settings.timeout,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fall_back_to_provider_sampling() {
        let llm = LlmProviderConfig {
            temperature: Some(0.3),
            max_tokens: Some(512),
            ..LlmProviderConfig::default()
        };
        let mut config = AgentConfig::rag_agent();
        config.temperature = Some(0.9);

        let settings = WorkerSettings::resolve(&config, &llm);
        assert_eq!(settings.temperature, Some(0.9));
        assert_eq!(settings.max_tokens, Some(512));
        assert_eq!(settings.max_iterations, 5);
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }

    #[test]
    fn reply_is_named_after_worker() {
        let output = WorkerOutput::reply(WorkerKind::RagAgent, "done");
        assert_eq!(output.message.name.as_deref(), Some("rag_agent"));
        assert!(output.update.is_empty());
    }
}
