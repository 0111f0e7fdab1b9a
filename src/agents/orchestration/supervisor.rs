//! Routing decisions over the conversation

use std::sync::Arc;

use serde_json::Value;

use crate::adapters::tools::schema_for;
use crate::agents::core::prompts::{self, RosterEntry};
use crate::agents::domain::{Message, Route, RoutingDecision, ToolDefinition};
use crate::agents::error::{AgentResult, DispatchError};
use crate::agents::llm::{CompletionRequest, LlmProvider, ToolChoice};

/// Name of the function the model is forced to call
pub const ROUTE_FUNCTION: &str = "route";

/// Picks the next worker, or FINISH, for a conversation
pub struct Supervisor {
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    temperature: Option<f32>,
}

impl Supervisor {
    /// Render the routing instruction once for the given roster.
    /// `template` replaces the built-in instruction when present.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        roster: &[RosterEntry],
        template: Option<&str>,
        temperature: Option<f32>,
    ) -> AgentResult<Self> {
        let system_prompt =
            prompts::render_supervisor_prompt(template.unwrap_or(prompts::SUPERVISOR_TEMPLATE), roster)?;
        Ok(Self {
            llm,
            system_prompt,
            temperature,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn route_tool() -> ToolDefinition {
        ToolDefinition::new(
            ROUTE_FUNCTION,
            "Select the next role.",
            schema_for::<RoutingDecision>(),
        )
    }

    /// Ask the model for the next route.
    ///
    /// Exactly one label comes back per call. Labels outside the route set
    /// are reported as [`DispatchError::Routing`], never defaulted.
    pub async fn decide(&self, messages: &[Message]) -> Result<RoutingDecision, DispatchError> {
        if messages.is_empty() {
            return Err(DispatchError::EmptyConversation);
        }

        let mut prompt = Vec::with_capacity(messages.len() + 1);
        prompt.push(Message::system(&self.system_prompt));
        prompt.extend(messages.iter().cloned());

        let response = self
            .llm
            .complete(CompletionRequest {
                messages: prompt,
                temperature: self.temperature,
                tools: Some(vec![Self::route_tool()]),
                tool_choice: Some(ToolChoice::Tool {
                    name: ROUTE_FUNCTION.to_string(),
                }),
                ..Default::default()
            })
            .await?;

        let decision = parse_decision(&response.message)?;
        tracing::debug!(next = %decision.next, "supervisor decided");
        Ok(decision)
    }
}

/// Extract the routing label from the model's reply.
///
/// Accepts a `route` function call, a JSON object with `next`, or a bare label.
pub fn parse_decision(message: &Message) -> Result<RoutingDecision, DispatchError> {
    if let Some(calls) = message.tool_calls.as_ref().filter(|c| !c.is_empty()) {
        let call = calls
            .iter()
            .find(|c| c.name == ROUTE_FUNCTION)
            .unwrap_or(&calls[0]);
        return decision_from_value(&call.arguments);
    }

    let content = message.content.trim();
    match serde_json::from_str::<Value>(content) {
        Ok(value @ Value::Object(_)) => decision_from_value(&value),
        _ => Route::parse_label(content).map(|next| RoutingDecision { next }),
    }
}

fn decision_from_value(value: &Value) -> Result<RoutingDecision, DispatchError> {
    match value.get("next").and_then(Value::as_str) {
        Some(label) => Route::parse_label(label).map(|next| RoutingDecision { next }),
        None => Err(DispatchError::Routing {
            label: value.to_string(),
        }),
    }
}
