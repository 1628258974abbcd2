//! Tool registry for managing available tools

use crate::error::ToolError;
use crate::llm::{FunctionDefinition, ToolDefinition};
use crate::tools::schema::to_json_schema;
use crate::tools::Tool;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable catalog of tools, shared by every agent session
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    catalog: Vec<ToolDefinition>,
}

/// Builder used at startup to populate a [`ToolRegistry`]
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; names must be unique
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Result<Self, ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool { name });
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(self)
    }

    /// Freeze the registry. The catalog keeps registration order.
    pub fn build(self) -> ToolRegistry {
        let catalog = self
            .order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: to_json_schema(&tool.parameters()),
                },
            })
            .collect();

        ToolRegistry {
            tools: self.tools,
            catalog,
        }
    }
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Look up a tool by name
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })
    }

    /// Tool definitions handed to the model on every planning step
    pub fn list(&self) -> &[ToolDefinition] {
        &self.catalog
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.catalog
            .iter()
            .map(|def| def.function.name.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Result, ToolError};
    use crate::tools::builtin::advertising_registry;
    use crate::tools::{ParamKind, ParameterSpec, Tool, ToolArgs, ToolRegistry};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back"
        }

        fn parameters(&self) -> Vec<ParameterSpec> {
            vec![ParameterSpec::required("text", ParamKind::String, "Text to echo")]
        }

        async fn execute(&self, args: ToolArgs) -> Result<Value> {
            Ok(json!(args.get::<String>("text")?))
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let result = ToolRegistry::builder()
            .register(Arc::new(EchoTool))
            .and_then(|b| b.register(Arc::new(EchoTool)));

        match result {
            Err(ToolError::DuplicateTool { name }) => assert_eq!(name, "echo"),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("duplicate registration should fail"),
        }
    }

    #[test]
    fn test_lookup_unknown_tool() {
        let registry = ToolRegistry::builder()
            .register(Arc::new(EchoTool))
            .unwrap()
            .build();

        assert!(registry.lookup("echo").is_ok());
        match registry.lookup("get_unicorn_stats") {
            Err(ToolError::UnknownTool { name }) => assert_eq!(name, "get_unicorn_stats"),
            _ => panic!("expected UnknownTool"),
        }
    }

    #[test]
    fn test_advertising_registry_has_all_tools() {
        let registry = advertising_registry().unwrap();
        let expected_tools = vec![
            "get_account_overview",
            "get_campaign_metrics",
            "get_search_terms",
            "get_keywords",
            "get_ads",
            "generate_ad_copy",
            "generate_weekly_report",
        ];

        assert_eq!(registry.names(), expected_tools);
        assert_eq!(registry.len(), expected_tools.len());
    }

    #[test]
    fn test_catalog_schemas() {
        let registry = advertising_registry().unwrap();

        for def in registry.list() {
            assert_eq!(def.tool_type, "function");
            assert!(
                !def.function.description.is_empty(),
                "Tool '{}' has empty description",
                def.function.name
            );

            let schema = def.function.parameters.as_object().unwrap();
            assert_eq!(schema.get("type").and_then(Value::as_str), Some("object"));
            let props = schema.get("properties").and_then(Value::as_object).unwrap();
            assert!(
                !props.is_empty(),
                "Tool '{}' has no properties in schema",
                def.function.name
            );
        }
    }
}
