// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! A mapping from MCP method name to handler. `register`
//! overwrites silently; `get_handler` is O(1). The table is built once
//! at startup via [`RouterBuilder`] and frozen into an immutable
//! [`Router`] — there is no mutation path once a request can reach it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext};
use serde_json::Value;

/// A single MCP method's implementation.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn handle(&self, ctx: ExecutionContext, params: Value) -> Result<Value, CoreError>;
}

#[derive(Default)]
pub struct RouterBuilder {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `method`. A second call with the same
    /// name silently replaces the first.
    pub fn register(mut self, method: impl Into<String>, handler: Arc<dyn MethodHandler>) -> Self {
        self.handlers.insert(method.into(), handler);
        self
    }

    pub fn build(self) -> Router {
        Router {
            handlers: self.handlers,
        }
    }
}

/// Thread-safe once built: reads never contend with writes because
/// there are no writes after [`RouterBuilder::build`].
pub struct Router {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn get_handler(&self, method: &str) -> Option<Arc<dyn MethodHandler>> {
        self.handlers.get(method).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl MethodHandler for Echo {
        async fn handle(&self, _ctx: ExecutionContext, params: Value) -> Result<Value, CoreError> {
            Ok(params)
        }
    }

    struct Other;

    #[async_trait]
    impl MethodHandler for Other {
        async fn handle(&self, _ctx: ExecutionContext, _params: Value) -> Result<Value, CoreError> {
            Ok(Value::String("other".into()))
        }
    }

    #[test]
    fn get_handler_is_none_for_unregistered_method() {
        let router = Router::builder().build();
        assert!(router.get_handler("tools/call").is_none());
    }

    #[tokio::test]
    async fn register_overwrites_silently() {
        let router = Router::builder()
            .register("tools/call", Arc::new(Echo))
            .register("tools/call", Arc::new(Other))
            .build();
        let handler = router.get_handler("tools/call").unwrap();
        let out = handler
            .handle(ExecutionContext::default(), Value::Null)
            .await
            .unwrap();
        assert_eq!(out, Value::String("other".into()));
    }
}
