//! ReAct loop (reasoning + acting) shared by the tool-using workers

use std::sync::Arc;
use std::time::Instant;

use crate::agents::domain::{Message, ToolCallResult, ToolDefinition};
use crate::agents::error::AgentResult;
use crate::agents::llm::{CompletionRequest, LlmProvider, ToolChoice};
use crate::domain::ToolPort;

/// What a loop run produced
#[derive(Debug, Clone, Default)]
pub struct ReActOutcome {
    /// Final assistant text, possibly empty
    pub content: String,
    /// Every tool call made, in order
    pub tool_calls: Vec<ToolCallResult>,
    /// Model turns used, including a forced final turn
    pub iterations: u32,
}

/// Tool-calling loop over a restricted toolset
pub struct ReActLoop {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolPort>,
    system_prompt: String,
    max_iterations: u32,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ReActLoop {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolPort>,
        system_prompt: impl Into<String>,
        max_iterations: u32,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations: max_iterations.max(1),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        match self.tools.list_tools().await {
            Ok(tools) => tools.into_iter().map(ToolDefinition::from).collect(),
            Err(e) => {
                tracing::warn!("Failed to list tools: {}", e);
                Vec::new()
            }
        }
    }

    fn request(&self, messages: &[Message], tools: &[ToolDefinition], choice: Option<ToolChoice>) -> CompletionRequest {
        CompletionRequest {
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: if tools.is_empty() { None } else { Some(tools.to_vec()) },
            tool_choice: if tools.is_empty() { None } else { choice },
            ..Default::default()
        }
    }

    /// Run the loop over `history` (the conversation so far).
    ///
    /// Tool failures are fed back to the model as `Error: ...` tool messages.
    /// If the model is still calling tools when the iteration budget runs
    /// out, one more turn is made with tool use disabled.
    pub async fn run(&self, history: &[Message]) -> AgentResult<ReActOutcome> {
        let tools = self.tool_definitions().await;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(history.iter().cloned());

        let mut outcome = ReActOutcome::default();

        while outcome.iterations < self.max_iterations {
            outcome.iterations += 1;
            let response = self
                .llm
                .complete(self.request(&messages, &tools, Some(ToolChoice::Auto)))
                .await?;

            let reply = response.message;
            let Some(tool_calls) = reply.tool_calls.clone().filter(|calls| !calls.is_empty()) else {
                outcome.content = reply.content;
                return Ok(outcome);
            };

            messages.push(reply);

            for call in &tool_calls {
                tracing::debug!(tool = %call.name, iteration = outcome.iterations, "calling tool");
                let started = Instant::now();
                let result = self.tools.execute_tool(&call.name, call.arguments.clone()).await;
                let elapsed = started.elapsed().as_millis() as u64;

                match result {
                    Ok(output) => {
                        messages.push(Message::tool_result(&call.id, &output));
                        outcome
                            .tool_calls
                            .push(ToolCallResult::success(call, output, elapsed));
                    }
                    Err(e) => {
                        tracing::warn!(tool = %call.name, "tool call failed: {}", e);
                        messages.push(Message::tool_error(&call.id, &e));
                        outcome
                            .tool_calls
                            .push(ToolCallResult::failure(call, e.to_string(), elapsed));
                    }
                }
            }
        }

        tracing::debug!(iterations = outcome.iterations, "iteration budget spent, forcing an answer");
        outcome.iterations += 1;
        let response = self
            .llm
            .complete(self.request(&messages, &tools, Some(ToolChoice::None)))
            .await?;
        outcome.content = response.message.content;
        Ok(outcome)
    }
}
