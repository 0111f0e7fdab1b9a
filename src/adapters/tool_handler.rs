use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::tools::ToolAdapter;
use crate::domain::{Tool, ToolPort};

/// Named set of tool adapters, in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn ToolAdapter>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter; a later registration with the same name replaces the earlier one
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        let name = adapter.definition().name;
        self.tools.retain(|(existing, _)| *existing != name);
        self.tools.push((name, adapter));
    }

    pub fn with(mut self, adapter: Arc<dyn ToolAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|(existing, _)| existing == name)
    }

    fn get(&self, name: &str) -> Option<&Arc<dyn ToolAdapter>> {
        self.tools
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, adapter)| adapter)
    }

    /// Subset visible to one worker. Unknown names are an error.
    pub fn restricted(&self, names: &[String]) -> anyhow::Result<ToolRegistry> {
        let mut subset = ToolRegistry::new();
        for name in names {
            let adapter = self
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("Tool not registered: {}", name))?;
            subset.register(adapter.clone());
        }
        Ok(subset)
    }
}

#[async_trait]
impl ToolPort for ToolRegistry {
    async fn execute_tool(&self, name: &str, args: Value) -> anyhow::Result<Value> {
        let adapter = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool not found: {}", name))?;
        Ok(adapter.call(args).await?)
    }

    async fn list_tools(&self) -> anyhow::Result<Vec<Tool>> {
        Ok(self.tools.iter().map(|(_, adapter)| adapter.definition()).collect())
    }
}
