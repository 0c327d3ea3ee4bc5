// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The concrete `rmcp::ServerHandler` impl, wiring the router, the MCP
//! middleware chain, and the managers together. Grounded in the
//! teacher's `McpServer`: store the peer on first contact for
//! background notifications, decode through `serde_json::Value` at the
//! boundary, and convert `CoreError` into `rmcp::ErrorData` at the edge
//! rather than leaking it inward.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorData, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourcesResult, ListToolsResult, PaginatedRequestParam,
    PromptsCapability, ReadResourceRequestParam, ReadResourceResult, ResourcesCapability,
    ServerCapabilities, ServerInfo, ToolsCapability,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ServerHandler;

use mcprouter_core::{CoreError, ExecutionContext};

use crate::chain::{McpChain, McpRequest};
use crate::session::{Session, SessionRegistry};

/// Converts a domain error into the JSON-RPC error shape MCP clients
/// see, distinguishing caller mistakes (`invalid_params`) from
/// everything else (`internal_error`) the way the wider pack's MCP
/// servers do (e.g. `nexus`'s `crates/mcp/src/server.rs`).
fn to_error_data(err: CoreError) -> ErrorData {
    match err {
        CoreError::InvalidArgument(msg) => ErrorData::invalid_params(msg, None),
        other => ErrorData::internal_error(other.to_string(), None::<()>),
    }
}

/// The router's MCP-facing server. Cloneable: `rmcp` clones the
/// handler per connection, all state is held behind `Arc`.
#[derive(Clone)]
pub struct McpRouterServer {
    chain: Arc<McpChain>,
    sessions: SessionRegistry,
    peer: Arc<Mutex<Option<rmcp::Peer<RoleServer>>>>,
    instructions: String,
}

impl McpRouterServer {
    pub fn new(chain: Arc<McpChain>, sessions: SessionRegistry, instructions: impl Into<String>) -> Self {
        Self {
            chain,
            sessions,
            peer: Arc::new(Mutex::new(None)),
            instructions: instructions.into(),
        }
    }

    fn remember_peer(&self, peer: rmcp::Peer<RoleServer>) {
        let mut guard = self.peer.lock().unwrap();
        if guard.is_none() {
            self.sessions.set(Session::new(peer.clone()));
            *guard = Some(peer);
        }
    }

    async fn dispatch(
        &self,
        method: &str,
        params: serde_json::Value,
        profile_id: Option<String>,
    ) -> Result<serde_json::Value, CoreError> {
        let req = McpRequest {
            method: method.to_string(),
            params,
            ctx: ExecutionContext {
                profile_id,
                ..Default::default()
            },
        };
        self.chain.dispatch(req).await
    }
}

#[allow(refining_impl_trait_reachable)]
impl ServerHandler for McpRouterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(true),
                }),
                prompts: Some(PromptsCapability {
                    list_changed: Some(true),
                }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: Some(true),
                }),
                ..Default::default()
            },
            instructions: Some(self.instructions.clone()),
            ..Default::default()
        }
    }

    fn call_tool<'a>(
        &'a self,
        params: CallToolRequestParam,
        ctx: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send + 'a>> {
        self.remember_peer(ctx.peer.clone());
        Box::pin(async move {
            let profile_id = extract_profile(&ctx);
            let request_value = serde_json::json!({
                "name": params.name,
                "arguments": params.arguments,
            });
            let value = self
                .dispatch("tools/call", request_value, profile_id)
                .await
                .map_err(to_error_data)?;
            serde_json::from_value(value)
                .map_err(|e| ErrorData::parse_error(format!("failed to parse result: {e}"), None))
        })
    }

    fn list_tools<'a>(
        &'a self,
        _params: Option<PaginatedRequestParam>,
        ctx: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<ListToolsResult, ErrorData>> + Send + 'a>> {
        self.remember_peer(ctx.peer.clone());
        Box::pin(async move {
            let profile_id = extract_profile(&ctx);
            let value = self
                .dispatch("tools/list", serde_json::Value::Null, profile_id)
                .await
                .map_err(to_error_data)?;
            serde_json::from_value(value)
                .map_err(|e| ErrorData::parse_error(format!("failed to parse result: {e}"), None))
        })
    }

    fn list_prompts<'a>(
        &'a self,
        _params: Option<PaginatedRequestParam>,
        ctx: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<ListPromptsResult, ErrorData>> + Send + 'a>> {
        self.remember_peer(ctx.peer.clone());
        Box::pin(async move {
            let profile_id = extract_profile(&ctx);
            let value = self
                .dispatch("prompts/list", serde_json::Value::Null, profile_id)
                .await
                .map_err(to_error_data)?;
            serde_json::from_value(value)
                .map_err(|e| ErrorData::parse_error(format!("failed to parse result: {e}"), None))
        })
    }

    fn list_resources<'a>(
        &'a self,
        _params: Option<PaginatedRequestParam>,
        ctx: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<ListResourcesResult, ErrorData>> + Send + 'a>> {
        self.remember_peer(ctx.peer.clone());
        Box::pin(async move {
            let profile_id = extract_profile(&ctx);
            let value = self
                .dispatch("resources/list", serde_json::Value::Null, profile_id)
                .await
                .map_err(to_error_data)?;
            serde_json::from_value(value)
                .map_err(|e| ErrorData::parse_error(format!("failed to parse result: {e}"), None))
        })
    }

    fn get_prompt<'a>(
        &'a self,
        params: GetPromptRequestParam,
        ctx: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<GetPromptResult, ErrorData>> + Send + 'a>> {
        self.remember_peer(ctx.peer.clone());
        Box::pin(async move {
            let profile_id = extract_profile(&ctx);
            let request_value = serde_json::json!({
                "name": params.name,
                "arguments": params.arguments,
            });
            let value = self
                .dispatch("prompts/get", request_value, profile_id)
                .await
                .map_err(to_error_data)?;
            serde_json::from_value(value)
                .map_err(|e| ErrorData::parse_error(format!("failed to parse result: {e}"), None))
        })
    }

    fn read_resource<'a>(
        &'a self,
        params: ReadResourceRequestParam,
        ctx: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<ReadResourceResult, ErrorData>> + Send + 'a>> {
        self.remember_peer(ctx.peer.clone());
        Box::pin(async move {
            let profile_id = extract_profile(&ctx);
            let request_value = serde_json::json!({ "uri": params.uri });
            let value = self
                .dispatch("resources/read", request_value, profile_id)
                .await
                .map_err(to_error_data)?;
            serde_json::from_value(value)
                .map_err(|e| ErrorData::parse_error(format!("failed to parse result: {e}"), None))
        })
    }
}

/// Profile extraction from the transport layer is a documented Non-goal
/// (see SPEC_FULL.md/DESIGN.md's Open Question resolutions): none of the
/// shipped transports (stdio, streamable HTTP, SSE) attach caller identity
/// to a request, so there is no header/extension here to read yet. This
/// always returns `None`, the documented "no profile in context" case —
/// every request sees the full, unfiltered catalog. Profile-scoped
/// authorization itself is fully implemented and tested by constructing
/// `ExecutionContext { profile_id: Some(..), .. }` directly.
fn extract_profile(_ctx: &RequestContext<RoleServer>) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_maps_to_invalid_params_error_code() {
        let err = to_error_data(CoreError::InvalidArgument("bad".into()));
        assert_eq!(err.message, "bad");
    }
}
