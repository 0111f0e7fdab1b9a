//! Scripted collaborators for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::domain::{Message, ToolCall};
use crate::agents::error::{LlmError, LlmResult};
use crate::agents::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

/// Replays queued responses and records every request it receives
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<LlmResult<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, content: &str) -> Self {
        self.push(Ok(CompletionResponse {
            message: Message::assistant(content),
            finish_reason: FinishReason::Stop,
            usage: None,
        }))
    }

    pub fn tool_call(self, name: &str, arguments: Value) -> Self {
        let call = ToolCall::new(ToolCall::generate_id(), name, arguments);
        self.push(Ok(CompletionResponse {
            message: Message::assistant_with_tools("", vec![call]),
            finish_reason: FinishReason::ToolCalls,
            usage: None,
        }))
    }

    pub fn failure(self, error: LlmError) -> Self {
        self.push(Err(error))
    }

    fn push(self, reply: LlmResult<CompletionResponse>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
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
            .unwrap_or_else(|| Err(LlmError::InvalidRequest("script exhausted".to_string())))
    }
}
