//! ToolRegistry - the name-to-tool table built once at startup

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::builtin::{
    ConnectAuthTool, CreateObjectTool, DisconnectAuthTool, DismissPresentationTool, EnsureVerbTool, EvalExprTool,
    GetHistoryTool, GetPropertyTool, GetVerbTool, InvokeVerbTool, ListPresentationsTool, ListPropertiesTool,
    ListSysobjsTool, ListVerbsTool, MoveObjectTool, ProgramVerbTool, RecycleObjectTool, ResolveObjectTool,
    SetPropertyTool,
};
use super::{Tool, ToolContext, ToolError, ToolResult};

/// Tool description as advertised to MCP clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Immutable table of tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder { tools: Vec::new() }
    }

    /// Registry with every built-in tool
    pub fn standard() -> Self {
        debug!("ToolRegistry::standard: called");
        Self::builder()
            .register(ConnectAuthTool)
            .register(DisconnectAuthTool)
            .register(EvalExprTool)
            .register(CreateObjectTool)
            .register(SetPropertyTool)
            .register(ListPropertiesTool)
            .register(GetPropertyTool)
            .register(ListVerbsTool)
            .register(GetVerbTool)
            .register(EnsureVerbTool)
            .register(ProgramVerbTool)
            .register(InvokeVerbTool)
            .register(ResolveObjectTool)
            .register(GetHistoryTool)
            .register(ListPresentationsTool)
            .register(DismissPresentationTool)
            .register(MoveObjectTool)
            .register(RecycleObjectTool)
            .register(ListSysobjsTool)
            .build()
    }

    /// Definitions sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!("ToolRegistry::definitions: called");
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(tool_name = %name, "ToolRegistry::execute: called");
        match self.tools.get(name) {
            Some(tool) => tool.execute(input, ctx).await,
            None => {
                debug!(tool_name = %name, "ToolRegistry::execute: unknown tool");
                ToolResult::from(Err::<Value, _>(ToolError::UnknownTool { name: name.to_string() }))
            }
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Collects tools before the registry is frozen
pub struct ToolRegistryBuilder {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn build(self) -> ToolRegistry {
        let mut tools: HashMap<String, Box<dyn Tool>> = HashMap::with_capacity(self.tools.len());
        for tool in self.tools {
            let name = tool.name().to_string();
            if tools.insert(name.clone(), tool).is_some() {
                warn!(tool_name = %name, "ToolRegistryBuilder::build: duplicate tool replaced");
            }
        }
        debug!(count = tools.len(), "ToolRegistryBuilder::build: registry built");
        ToolRegistry { tools }
    }
}
