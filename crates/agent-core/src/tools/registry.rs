use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::tools::executor::{parse_tool_args, Result};
use crate::tools::schema::parameters_schema;
use crate::tools::{
    validate_arguments, FunctionSchema, ParameterSpec, ToolArgs, ToolCall, ToolError,
    ToolExecutor, ToolSchema,
};

/// The code behind a tool. Receives arguments that already passed validation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> Result<String>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    async fn call(&self, args: ToolArgs) -> Result<String> {
        (self)(args).await
    }
}

/// Registered, immutable definition of a tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    pub fn new<H>(name: impl Into<String>, description: impl Into<String>, handler: H) -> Self
    where
        H: ToolHandler + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            schema_type: "function".to_string(),
            function: FunctionSchema {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: parameters_schema(&self.parameters),
            },
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid tool: {0}")]
    InvalidTool(String),
}

/// Name-keyed tool store. Re-registering a name replaces the previous descriptor.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<ToolDescriptor>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register(&self, mut descriptor: ToolDescriptor) -> std::result::Result<(), RegistryError> {
        let name = descriptor.name.trim().to_string();

        if name.is_empty() {
            return Err(RegistryError::InvalidTool(
                "tool name cannot be empty".to_string(),
            ));
        }

        if let Some(duplicate) = first_duplicate_parameter(&descriptor.parameters) {
            return Err(RegistryError::InvalidTool(format!(
                "tool '{}' declares parameter '{}' more than once",
                name, duplicate
            )));
        }

        descriptor.name = name.clone();
        if self.tools.insert(name.clone(), Arc::new(descriptor)).is_some() {
            log::debug!("Tool '{}' re-registered, previous descriptor replaced", name);
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// One definition per registered tool, sorted by name.
    pub fn list_tool_definitions(&self) -> Vec<ToolSchema> {
        let mut tools: Vec<ToolSchema> = self
            .tools
            .iter()
            .map(|entry| entry.value().to_schema())
            .collect();
        tools.sort_by(|left, right| left.function.name.cmp(&right.function.name));
        tools
    }

    pub fn list_tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Parse, validate and run a tool by name.
    pub async fn execute_raw(&self, name: &str, raw_arguments: &str) -> Result<String> {
        // Clone the Arc out so no map guard is held across the await.
        let descriptor = self
            .lookup(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let args = parse_tool_args(raw_arguments)?;
        validate_arguments(&descriptor.parameters, &args)?;

        descriptor.handler.call(args).await.map_err(|error| match error {
            ToolError::Execution(message) => ToolError::Execution(message),
            other => ToolError::Execution(other.to_string()),
        })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn first_duplicate_parameter(parameters: &[ParameterSpec]) -> Option<String> {
    let mut seen = HashSet::new();
    parameters
        .iter()
        .find(|parameter| !seen.insert(parameter.name.as_str()))
        .map(|parameter| parameter.name.clone())
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, call: &ToolCall) -> Result<String> {
        self.execute_raw(&call.function.name, &call.function.arguments)
            .await
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        self.list_tool_definitions()
    }
}
