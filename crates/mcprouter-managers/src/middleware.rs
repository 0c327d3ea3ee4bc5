// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The `ExecutionMiddleware` pipeline that wraps tool execution (spec
//! §4.6): middlewares are registered once at startup and compose as
//! `mw1(mw2(...(base)...))`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext, ExecutionRequest, ToolOutcome, UpstreamTool};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single link in the execution chain. Implementations call
/// `next.run(ctx, req)` to continue the chain, or short-circuit by
/// returning without calling it (e.g. a cache hit).
#[async_trait]
pub trait ExecutionMiddleware: Send + Sync {
    async fn handle(
        &self,
        ctx: ExecutionContext,
        req: ExecutionRequest,
        next: Next<'_>,
    ) -> Result<ToolOutcome, CoreError>;

    /// Name used in trace spans.
    fn name(&self) -> &'static str {
        "middleware"
    }
}

/// The continuation handed to a middleware. Calling [`Next::run`]
/// invokes the next middleware in the chain, or the tool itself once
/// the chain is exhausted.
pub struct Next<'a> {
    pipeline: &'a MiddlewarePipeline,
    index: usize,
    tool: Arc<dyn UpstreamTool>,
}

impl<'a> Next<'a> {
    pub async fn run(
        self,
        ctx: ExecutionContext,
        req: ExecutionRequest,
    ) -> Result<ToolOutcome, CoreError> {
        self.pipeline
            .dispatch_at(self.index, ctx, req, self.tool)
            .await
    }
}

/// An ordered stack of [`ExecutionMiddleware`], composed once at
/// startup and shared by every call through the tool manager.
#[derive(Default)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Arc<dyn ExecutionMiddleware>>,
}

impl MiddlewarePipeline {
    pub fn new(middlewares: Vec<Arc<dyn ExecutionMiddleware>>) -> Self {
        Self { middlewares }
    }

    pub async fn dispatch(
        &self,
        ctx: ExecutionContext,
        req: ExecutionRequest,
        tool: Arc<dyn UpstreamTool>,
    ) -> Result<ToolOutcome, CoreError> {
        self.dispatch_at(0, ctx, req, tool).await
    }

    fn dispatch_at<'a>(
        &'a self,
        index: usize,
        ctx: ExecutionContext,
        req: ExecutionRequest,
        tool: Arc<dyn UpstreamTool>,
    ) -> BoxFuture<'a, Result<ToolOutcome, CoreError>> {
        Box::pin(async move {
            match self.middlewares.get(index) {
                Some(mw) => {
                    tracing::trace!(middleware = mw.name(), index, "dispatching");
                    let next = Next {
                        pipeline: self,
                        index: index + 1,
                        tool: tool.clone(),
                    };
                    mw.handle(ctx, req, next).await
                }
                None => tool.execute(ctx, req).await,
            }
        })
    }
}

/// Per-entry expiry so each cached tool result honors its own tool's
/// `cache_config.ttl` instead of one cache-wide TTL.
struct CacheEntry {
    outcome: ToolOutcome,
    ttl: Duration,
}

struct PerEntryExpiry;

impl moka::Expiry<String, CacheEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Caches `execute` results keyed on `(tool_id, normalized inputs)`,
/// honoring the tool's `cache_config.ttl`. Tools without a
/// `cache_config` are never cached.
pub struct CachingMiddleware {
    cache: moka::future::Cache<String, CacheEntry>,
}

impl CachingMiddleware {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: moka::future::Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryExpiry)
                .build(),
        }
    }

    fn cache_key(tool_id: &str, inputs: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(tool_id.as_bytes());
        hasher.update(b"\0");
        hasher.update(inputs);
        format!("{:x}", hasher.finalize())
    }

    /// Drops every cached entry. Backs `CacheService.ClearCache`.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl Default for CachingMiddleware {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ExecutionMiddleware for CachingMiddleware {
    async fn handle(
        &self,
        ctx: ExecutionContext,
        req: ExecutionRequest,
        next: Next<'_>,
    ) -> Result<ToolOutcome, CoreError> {
        let Some(ttl) = next.tool.cache_config().map(|c| c.ttl) else {
            return next.run(ctx, req).await;
        };

        let key = Self::cache_key(&req.tool_id, &req.tool_inputs);
        if let Some(entry) = self.cache.get(&key).await {
            tracing::trace!(tool_id = %req.tool_id, "cache hit");
            return Ok(entry.outcome);
        }

        let outcome = next.run(ctx, req).await?;
        self.cache
            .insert(
                key,
                CacheEntry {
                    outcome: outcome.clone(),
                    ttl,
                },
            )
            .await;
        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "caching"
    }
}
