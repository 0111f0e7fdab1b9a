use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ReActLoop, Worker, WorkerOutput};
use crate::adapters::tools::{scrape, web_search};
use crate::agents::domain::{ConversationState, StateUpdate, ToolCallResult, WorkerKind};
use crate::agents::error::AgentResult;

const EMPTY_REPLY: &str = "I could not find an answer to that.";

/// Web research worker
pub struct ResearcherWorker {
    react: ReActLoop,
    timeout: Duration,
}

impl ResearcherWorker {
    pub fn new(react: ReActLoop, timeout: Duration) -> Self {
        Self { react, timeout }
    }
}

#[async_trait]
impl Worker for ResearcherWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Researcher
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, state: &ConversationState) -> AgentResult<WorkerOutput> {
        let outcome = self.react.run(&state.messages).await?;
        tracing::info!(
            tool_calls = outcome.tool_calls.len(),
            iterations = outcome.iterations,
            "researcher finished"
        );

        let content = if outcome.content.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            outcome.content
        };

        Ok(WorkerOutput::reply(self.kind(), content)
            .with_update(collect_findings(&outcome.tool_calls)))
    }
}

/// Search queries, result URLs and page text gathered by successful tool calls
fn collect_findings(calls: &[ToolCallResult]) -> StateUpdate {
    let mut update = StateUpdate::default();

    for call in calls.iter().filter(|c| c.success) {
        match call.tool_name.as_str() {
            web_search::TOOL_NAME => {
                if let Some(query) = call.output.get("query").and_then(Value::as_str) {
                    update.search_query = Some(query.to_string());
                }
                let urls = call
                    .output
                    .get("results")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|hit| hit.get("url").and_then(Value::as_str));
                for url in urls {
                    if !update.urls_found.iter().any(|u| u == url) {
                        update.urls_found.push(url.to_string());
                    }
                }
            }
            scrape::TOOL_NAME => {
                let url = call.output.get("url").and_then(Value::as_str);
                let text = call.output.get("text").and_then(Value::as_str);
                if let (Some(url), Some(text)) = (url, text) {
                    update.scraped_content.insert(url.to_string(), text.to_string());
                }
            }
            _ => {}
        }
    }

    update
}
