//! Domain types for the agent system
//!
//! Messages exchanged with the LLM, tool call records, the per-request
//! conversation state and the routing vocabulary shared by the supervisor
//! and the dispatcher.

mod agent;
mod message;
mod state;
mod tool_call;

pub use agent::*;
pub use message::*;
pub use state::*;
pub use tool_call::*;
