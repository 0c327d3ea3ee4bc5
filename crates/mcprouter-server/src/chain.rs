// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The MCP server middleware chain: every incoming call
//! traverses DLP, then the router, then the per-kind list-filtering
//! middlewares, in that fixed order. Composed the same way the tool
//! execution pipeline is (`mcprouter_managers::middleware`): an
//! index-based recursive dispatch plus a `Next` continuation, since a
//! `Vec<Arc<dyn McpMiddleware>>` rules out a generic closure chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext};
use serde_json::Value;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An MCP request as it flows through the chain: method name plus
/// already-decoded JSON params.
#[derive(Debug, Clone)]
pub struct McpRequest {
    pub method: String,
    pub params: Value,
    pub ctx: ExecutionContext,
}

#[async_trait]
pub trait McpMiddleware: Send + Sync {
    async fn handle(&self, req: McpRequest, next: McpNext<'_>) -> Result<Value, CoreError>;

    fn name(&self) -> &'static str {
        "mcp_middleware"
    }
}

pub struct McpNext<'a> {
    chain: &'a McpChain,
    index: usize,
}

impl<'a> McpNext<'a> {
    pub async fn run(self, req: McpRequest) -> Result<Value, CoreError> {
        self.chain.dispatch_at(self.index, req).await
    }
}

/// The fixed DLP → router → list-filtering stack, built once at
/// startup and shared by every request.
pub struct McpChain {
    middlewares: Vec<Arc<dyn McpMiddleware>>,
}

impl McpChain {
    pub fn new(middlewares: Vec<Arc<dyn McpMiddleware>>) -> Self {
        Self { middlewares }
    }

    pub async fn dispatch(&self, req: McpRequest) -> Result<Value, CoreError> {
        self.dispatch_at(0, req).await
    }

    fn dispatch_at<'a>(&'a self, index: usize, req: McpRequest) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            match self.middlewares.get(index) {
                Some(mw) => {
                    tracing::trace!(middleware = mw.name(), index, method = %req.method, "dispatching");
                    let next = McpNext {
                        chain: self,
                        index: index + 1,
                    };
                    mw.handle(req, next).await
                }
                None => Err(CoreError::NotFound(format!(
                    "no handler for method {}",
                    req.method
                ))),
            }
        })
    }
}

/// Wraps a [`crate::router::Router`] as the chain's second stage (spec
/// §4.2 item 2): "if a handler is registered for the method, terminates
/// the chain with that handler; otherwise delegates to `next`." A
/// non-list method with no registered handler falls through to
/// whatever follows (there is none today — the chain ends with
/// `NotFound`, same as an empty table).
pub struct RouterMiddleware {
    router: Arc<crate::router::Router>,
}

impl RouterMiddleware {
    pub fn new(router: Arc<crate::router::Router>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl McpMiddleware for RouterMiddleware {
    async fn handle(&self, req: McpRequest, next: McpNext<'_>) -> Result<Value, CoreError> {
        match self.router.get_handler(&req.method) {
            Some(handler) => handler.handle(req.ctx, req.params).await,
            None => next.run(req).await,
        }
    }

    fn name(&self) -> &'static str {
        "router"
    }
}
