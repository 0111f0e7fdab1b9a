//! Multi-agent chat
//!
//! A supervisor model routes each request to one of three workers
//! (`researcher`, `vision_agent`, `rag_agent`) or ends the run with `FINISH`.
//!
//! ## Architecture
//!
//! - `domain/` - Messages, tool calls, routing labels and conversation state
//! - `llm/` - OpenAI-compatible chat completions client
//! - `core/` - Workers and the shared tool loop
//! - `orchestration/` - Supervisor and the dispatch state machine
//! - `handler` - Chat service built from settings

pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod handler;
pub mod llm;
pub mod orchestration;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::*;
pub use domain::*;
pub use error::*;
pub use handler::{ChatReply, ChatRequest, ChatService};
