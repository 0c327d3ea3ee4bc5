// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Profile-scoped list filtering. Each of
//! these middlewares intercepts exactly one `*/list` method and
//! returns a projection of its manager's catalog; every other method
//! passes through untouched. A list method MUST NOT reach the router —
//! these sit innermost in the chain, behind DLP and the router, so the
//! router only ever sees methods it has a handler for (list methods
//! are never registered there).

use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext};
use mcprouter_managers::{PromptManager, ResourceManager, ToolManager};
use serde_json::Value;

use crate::chain::{McpMiddleware, McpNext, McpRequest};
use crate::metrics::tools_list_total;

/// Resolves the allowed-service-id snapshot for a profile the same way
/// `ToolManager` does, so prompts/resources (which have no profile
/// table of their own, manager surface) filter
/// consistently with tools.
fn profile_filter(tool_manager: &ToolManager, ctx: &ExecutionContext) -> Option<ProfileFilter> {
    let profile_name = ctx.profile_id.as_deref()?;
    let (allowed, found) = tool_manager.get_allowed_service_ids(profile_name);
    Some(ProfileFilter { allowed, found })
}

struct ProfileFilter {
    allowed: std::collections::HashSet<String>,
    found: bool,
}

impl ProfileFilter {
    fn retains(&self, service_id: &str) -> bool {
        self.found && self.allowed.contains(service_id)
    }
}

pub struct ToolsListFilter {
    tool_manager: Arc<ToolManager>,
}

impl ToolsListFilter {
    pub fn new(tool_manager: Arc<ToolManager>) -> Self {
        Self { tool_manager }
    }
}

#[async_trait]
impl McpMiddleware for ToolsListFilter {
    async fn handle(&self, req: McpRequest, next: McpNext<'_>) -> Result<Value, CoreError> {
        if req.method != "tools/list" {
            return next.run(req).await;
        }
        tools_list_total();
        let tools = self
            .tool_manager
            .list_for_profile(req.ctx.profile_id.as_deref());
        let views: Vec<Value> = tools
            .iter()
            .filter(|t| t.describe().input_schema.is_object())
            .filter(|t| self.tool_manager.is_service_healthy(&t.describe().service_id))
            .map(|t| {
                let d = t.describe();
                serde_json::json!({
                    "name": mcprouter_core::composite_tool_id(&d.service_id, &d.name),
                    "description": d.description,
                    "inputSchema": d.input_schema,
                })
            })
            .collect();
        Ok(serde_json::json!({ "tools": views }))
    }

    fn name(&self) -> &'static str {
        "tools_list_filter"
    }
}

pub struct PromptsListFilter {
    prompt_manager: Arc<PromptManager>,
    tool_manager: Arc<ToolManager>,
}

impl PromptsListFilter {
    pub fn new(prompt_manager: Arc<PromptManager>, tool_manager: Arc<ToolManager>) -> Self {
        Self {
            prompt_manager,
            tool_manager,
        }
    }
}

#[async_trait]
impl McpMiddleware for PromptsListFilter {
    async fn handle(&self, req: McpRequest, next: McpNext<'_>) -> Result<Value, CoreError> {
        if req.method != "prompts/list" {
            return next.run(req).await;
        }
        let filter = profile_filter(&self.tool_manager, &req.ctx);
        let prompts = self.prompt_manager.list();
        let views: Vec<Value> = prompts
            .into_iter()
            .filter(|p| self.tool_manager.is_service_healthy(&p.service_id))
            .filter(|p| match &filter {
                None => true,
                Some(f) => f.retains(&p.service_id),
            })
            .map(|p| {
                serde_json::json!({
                    "name": p.composite_id(),
                    "arguments": p.argument_schema,
                })
            })
            .collect();
        Ok(serde_json::json!({ "prompts": views }))
    }

    fn name(&self) -> &'static str {
        "prompts_list_filter"
    }
}

pub struct ResourcesListFilter {
    resource_manager: Arc<ResourceManager>,
    tool_manager: Arc<ToolManager>,
}

impl ResourcesListFilter {
    pub fn new(resource_manager: Arc<ResourceManager>, tool_manager: Arc<ToolManager>) -> Self {
        Self {
            resource_manager,
            tool_manager,
        }
    }
}

#[async_trait]
impl McpMiddleware for ResourcesListFilter {
    async fn handle(&self, req: McpRequest, next: McpNext<'_>) -> Result<Value, CoreError> {
        if req.method != "resources/list" {
            return next.run(req).await;
        }
        let filter = profile_filter(&self.tool_manager, &req.ctx);
        let resources = self.resource_manager.list();
        let views: Vec<Value> = resources
            .into_iter()
            .filter(|r| self.tool_manager.is_service_healthy(&r.service_id))
            .filter(|r| match &filter {
                None => true,
                Some(f) => f.retains(&r.service_id),
            })
            .map(|r| {
                serde_json::json!({
                    "uri": r.uri,
                    "mimeType": r.mime_type,
                    "description": r.description,
                })
            })
            .collect();
        Ok(serde_json::json!({ "resources": views }))
    }

    fn name(&self) -> &'static str {
        "resources_list_filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::McpChain;
    use mcprouter_core::testing::{descriptor, StaticTool};
    use mcprouter_core::ToolOutcome;
    use mcprouter_managers::MiddlewarePipeline;

    fn tool_manager_with(service_id: &str, name: &str) -> Arc<ToolManager> {
        let mgr = Arc::new(ToolManager::new(MiddlewarePipeline::new(vec![])));
        mgr.add(Arc::new(StaticTool::returning(
            descriptor(service_id, name),
            ToolOutcome::Other(serde_json::json!("ok")),
        )));
        mgr
    }

    #[tokio::test]
    async fn tools_list_method_short_circuits_with_full_catalog() {
        let tm = tool_manager_with("svc", "echo");
        let chain = McpChain::new(vec![Arc::new(ToolsListFilter::new(tm))]);
        let req = McpRequest {
            method: "tools/list".into(),
            params: Value::Null,
            ctx: ExecutionContext::default(),
        };
        let out = chain.dispatch(req).await.unwrap();
        assert_eq!(out["tools"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unhealthy_service_is_excluded_from_tools_list() {
        let tm = tool_manager_with("svc", "echo");
        tm.add_service_info(mcprouter_core::ServiceInfo {
            service_id: "svc".into(),
            name: "svc".into(),
            config: serde_json::json!({}),
            health_status: mcprouter_core::HealthStatus::Healthy,
        });
        tm.set_service_health("svc", mcprouter_core::HealthStatus::Unhealthy);
        let chain = McpChain::new(vec![Arc::new(ToolsListFilter::new(tm))]);
        let req = McpRequest {
            method: "tools/list".into(),
            params: Value::Null,
            ctx: ExecutionContext::default(),
        };
        let out = chain.dispatch(req).await.unwrap();
        assert!(out["tools"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_list_method_passes_through_untouched() {
        struct Terminal;
        #[async_trait]
        impl McpMiddleware for Terminal {
            async fn handle(&self, req: McpRequest, _next: McpNext<'_>) -> Result<Value, CoreError> {
                Ok(Value::String(req.method))
            }
        }
        let tm = tool_manager_with("svc", "echo");
        let chain = McpChain::new(vec![Arc::new(ToolsListFilter::new(tm)), Arc::new(Terminal)]);
        let req = McpRequest {
            method: "tools/call".into(),
            params: Value::Null,
            ctx: ExecutionContext::default(),
        };
        let out = chain.dispatch(req).await.unwrap();
        assert_eq!(out, Value::String("tools/call".into()));
    }
}
