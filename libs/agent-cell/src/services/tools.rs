use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{ToolErrorKind, ToolOutcome, ToolRequest};

/// Name, description and JSON-schema parameters advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A typed backend operation the model can call by name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, arguments: Value) -> Result<Value, ToolError>;
}

/// Decode tool arguments into their typed form.
pub fn decode_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| {
        ToolError::new(
            ToolErrorKind::InvalidArguments,
            format!("Invalid arguments for {}: {}", tool, e),
        )
    })
}

/// Name to handler table. Execution never fails: unknown names, handler
/// errors and panics all come back as [`ToolOutcome::Failure`].
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.definition().name;
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!("Tool {} registered twice, keeping the newest handler", name);
        } else {
            self.order.push(name);
        }
    }

    pub fn with(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|handler| handler.definition())
            .collect()
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub async fn execute(&self, request: &ToolRequest) -> ToolOutcome {
        let Some(handler) = self.handlers.get(&request.name) else {
            warn!("Model requested unknown tool {}", request.name);
            return ToolOutcome::Failure {
                kind: ToolErrorKind::UnknownTool,
                message: format!("Unknown function: {}", request.name),
            };
        };

        let started = Instant::now();
        let call = AssertUnwindSafe(handler.call(request.arguments.clone())).catch_unwind();

        match call.await {
            Ok(Ok(value)) => {
                info!(
                    "Tool {} succeeded in {}ms",
                    request.name,
                    started.elapsed().as_millis()
                );
                ToolOutcome::Success(value)
            }
            Ok(Err(e)) => {
                warn!("Tool {} failed ({}): {}", request.name, e.kind, e.message);
                ToolOutcome::Failure {
                    kind: e.kind,
                    message: e.message,
                }
            }
            Err(_) => {
                error!("Tool {} panicked", request.name);
                ToolOutcome::Failure {
                    kind: ToolErrorKind::Internal,
                    message: format!("{} failed unexpectedly", request.name),
                }
            }
        }
    }
}
