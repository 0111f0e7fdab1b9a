//! Built-in instructions for the supervisor and the workers

use serde::Serialize;
use tera::{Context, Tera};

use crate::agents::domain::Route;
use crate::agents::error::{AgentError, AgentResult};

pub const SUPERVISOR_TEMPLATE: &str = "\
You are a supervisor coordinating the following workers:
{% for worker in workers %}- {{ worker.name }}: {{ worker.description }}
{% endfor %}
Read the conversation and decide which worker should act next. \
Each worker completes its task and reports its result back to you. \
When the user's request has been answered, or none of the workers can help, answer FINISH.
Reply by calling the route function with exactly one of: {{ options | join(sep=\", \") }}.";

pub const RESEARCHER_PROMPT: &str = "\
You are a research assistant with access to web search, a page reader and a file writer. \
Search for sources relevant to the user's question, read the most promising pages, \
and answer with a concise summary that cites the URLs you used. \
Only write a file when the user asks for one.";

pub const VISION_PROMPT: &str = "\
You are an image analyst. Look carefully at the attached image and answer the user's \
question about it. If the question is general, describe what the image shows.";

pub const RAG_PROMPT: &str = "\
You answer questions using the user's document collection. Call the retrieval tool \
with a focused query, then answer from the returned passages only. \
If the passages do not contain the answer, say so.";

/// Worker entry exposed to the supervisor template
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub description: String,
}

/// Render the supervisor's routing instruction.
///
/// The template sees `workers` (name, description) and `options`, the
/// worker labels followed by FINISH.
pub fn render_supervisor_prompt(template: &str, roster: &[RosterEntry]) -> AgentResult<String> {
    let mut options: Vec<&str> = roster.iter().map(|w| w.name.as_str()).collect();
    options.push(Route::FINISH_LABEL);

    let mut context = Context::new();
    context.insert("workers", roster);
    context.insert("options", &options);

    Tera::one_off(template, &context, false)
        .map_err(|e| AgentError::Configuration(format!("Invalid supervisor prompt template: {}", e)))
}
