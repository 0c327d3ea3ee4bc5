// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The `UpstreamTool` capability: dynamic dispatch over tool
//! kinds (HTTP/gRPC/OpenAPI/WebSocket/command) collapses to one trait.
//! Concrete transport adapters live outside this workspace; this crate
//! only defines the seam and a descriptor type.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{CacheConfig, ExecutionRequest};

/// Static metadata describing a tool, independent of how it executes.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Bare (unsanitized) tool name.
    pub name: String,
    /// Owning service id.
    pub service_id: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Human-facing description.
    pub description: String,
    /// JSON Schema describing accepted input.
    pub input_schema: Value,
}

/// The value an upstream's `execute` call resolves to, prior to result
/// coercion. `Shaped` corresponds to rule (a), `Map` to
/// rule (b), `Other` to rule (c).
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Already in `CallToolResult` shape.
    Shaped(rmcp::model::CallToolResult),
    /// A map resembling `{content, isError}`.
    Map(serde_json::Map<String, Value>),
    /// Anything else; gets JSON-serialized and wrapped in a text part.
    Other(Value),
}

/// Per-call context threaded through to an upstream's `execute`.
///
/// Holds the identity fields context carries the
/// authenticated user, the active profile, and (during tool execution)
/// the session handle and propagated headers. The session itself is
/// typed in `mcprouter-server` to avoid a dependency cycle; upstream
/// implementations receive it as an opaque `Option<Box<dyn std::any::Any + Send + Sync>>`
/// is deliberately avoided here — instead `mcprouter-server` wraps this
/// type with its own richer execution context before calling out.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Authenticated user id, if any.
    pub user_id: Option<String>,
    /// Active profile id, if any.
    pub profile_id: Option<String>,
    /// HTTP header names/values to propagate to the upstream, per the
    /// service's `context_propagation.headers` configuration.
    pub propagated_headers: Vec<(String, String)>,
}

/// A callable backed by some upstream transport.
#[async_trait]
pub trait UpstreamTool: Send + Sync {
    /// Static metadata about this tool.
    fn describe(&self) -> &ToolDescriptor;

    /// Execute the tool against its upstream.
    async fn execute(
        &self,
        ctx: ExecutionContext,
        req: ExecutionRequest,
    ) -> Result<ToolOutcome, CoreError>;

    /// Cache behavior, if any, for this tool's results.
    fn cache_config(&self) -> Option<&CacheConfig> {
        None
    }
}
