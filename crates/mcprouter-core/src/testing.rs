// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Test doubles for `UpstreamTool`. Concrete HTTP/gRPC/OpenAPI/
//! WebSocket/command adapters are out of scope for this workspace
//!; this in-memory double lets the manager and server layers
//! be exercised without one.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::Mutex;

use crate::error::CoreError;
use crate::model::{CacheConfig, ExecutionRequest};
use crate::tool::{ExecutionContext, ToolDescriptor, ToolOutcome, UpstreamTool};

/// An `UpstreamTool` whose result is fixed at construction time, or
/// computed by a closure. Useful for exercising the server's
/// execution path, caching, and error handling deterministically.
pub struct StaticTool {
    descriptor: ToolDescriptor,
    cache_config: Option<CacheConfig>,
    responder: Arc<dyn Fn(&ExecutionRequest) -> Result<ToolOutcome, CoreError> + Send + Sync>,
    call_count: Mutex<usize>,
}

impl StaticTool {
    /// Build a tool that always returns `outcome`.
    pub fn returning(descriptor: ToolDescriptor, outcome: ToolOutcome) -> Self {
        Self::with_responder(descriptor, move |_| Ok(outcome.clone()))
    }

    /// Build a tool that always fails with `err`.
    pub fn failing(descriptor: ToolDescriptor, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_responder(descriptor, move |_| {
            Err(CoreError::Upstream(message.clone()))
        })
    }

    /// Build a tool whose response is computed by `responder` on each call.
    pub fn with_responder<F>(descriptor: ToolDescriptor, responder: F) -> Self
    where
        F: Fn(&ExecutionRequest) -> Result<ToolOutcome, CoreError> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            cache_config: None,
            responder: Arc::new(responder),
            call_count: Mutex::new(0),
        }
    }

    /// Attach a cache config to this double.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = Some(config);
        self
    }

    /// Number of times `execute` has been called so far.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl UpstreamTool for StaticTool {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        req: ExecutionRequest,
    ) -> Result<ToolOutcome, CoreError> {
        *self.call_count.lock().unwrap() += 1;
        (self.responder)(&req)
    }

    fn cache_config(&self) -> Option<&CacheConfig> {
        self.cache_config.as_ref()
    }
}

/// Build a minimal descriptor for tests.
pub fn descriptor(service_id: &str, name: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        service_id: service_id.to_string(),
        display_name: name.to_string(),
        description: format!("test tool {name}"),
        input_schema: Value::Object(Default::default()),
    }
}

/// A [`PromptEvaluator`](crate::PromptEvaluator) that always returns a
/// fixed set of messages, or fails with a fixed message.
pub struct StaticPromptEvaluator {
    messages: Result<Vec<crate::PromptMessage>, String>,
}

impl StaticPromptEvaluator {
    pub fn returning(messages: Vec<crate::PromptMessage>) -> Self {
        Self {
            messages: Ok(messages),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            messages: Err(message.into()),
        }
    }
}

#[async_trait]
impl crate::PromptEvaluator for StaticPromptEvaluator {
    async fn evaluate(
        &self,
        _ctx: ExecutionContext,
        _arguments: Value,
    ) -> Result<Vec<crate::PromptMessage>, CoreError> {
        self.messages.clone().map_err(CoreError::Upstream)
    }
}

/// A [`ResourceReader`](crate::ResourceReader) that always returns a
/// fixed [`crate::ResourceContents`], or fails with a fixed message.
pub struct StaticResourceReader {
    contents: Result<crate::ResourceContents, String>,
}

impl StaticResourceReader {
    pub fn returning(contents: crate::ResourceContents) -> Self {
        Self {
            contents: Ok(contents),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            contents: Err(message.into()),
        }
    }
}

#[async_trait]
impl crate::ResourceReader for StaticResourceReader {
    async fn read(&self, _ctx: ExecutionContext) -> Result<crate::ResourceContents, CoreError> {
        self.contents.clone().map_err(CoreError::Upstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_tool_counts_calls() {
        let tool = StaticTool::returning(
            descriptor("svc", "echo"),
            ToolOutcome::Other(Value::String("ok".into())),
        );
        let req = ExecutionRequest::new("svc.echo", b"{}".to_vec());
        tool.execute(ExecutionContext::default(), req.clone())
            .await
            .unwrap();
        tool.execute(ExecutionContext::default(), req).await.unwrap();
        assert_eq!(tool.call_count(), 2);
    }
}
