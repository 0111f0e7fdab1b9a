//! Worker roster types

use serde::{Deserialize, Serialize};

use super::WorkerKind;

/// Public description of a registered worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Route label of the worker
    pub name: WorkerKind,
    pub description: String,
    /// Tools the worker may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_tools: Vec<String>,
    pub llm_provider: String,
    pub llm_model: String,
}
