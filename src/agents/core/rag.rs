use std::time::Duration;

use async_trait::async_trait;

use super::{ReActLoop, Worker, WorkerOutput};
use crate::agents::domain::{ConversationState, WorkerKind};
use crate::agents::error::AgentResult;

const EMPTY_REPLY: &str = "The document collection does not cover that.";

/// Answers from the indexed document collection
pub struct RagWorker {
    react: ReActLoop,
    timeout: Duration,
}

impl RagWorker {
    pub fn new(react: ReActLoop, timeout: Duration) -> Self {
        Self { react, timeout }
    }
}

#[async_trait]
impl Worker for RagWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::RagAgent
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, state: &ConversationState) -> AgentResult<WorkerOutput> {
        let outcome = self.react.run(&state.messages).await?;
        let retrievals = outcome
            .tool_calls
            .iter()
            .filter(|c| c.success)
            .count();
        tracing::info!(retrievals, iterations = outcome.iterations, "rag agent finished");

        let content = if outcome.content.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            outcome.content
        };
        Ok(WorkerOutput::reply(self.kind(), content))
    }
}
