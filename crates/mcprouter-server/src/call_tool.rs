// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `CallTool`: resolve, authorize, log, meter, dispatch,
//! coerce, log again. Registered as the `tools/call` handler in the
//! router.

use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext, ExecutionRequest};
use mcprouter_managers::ToolManager;
use serde_json::Value;

use crate::coercion::coerce;
use crate::metrics::{tools_call_errors, tools_call_total, CallTimer};
use crate::redact::{LazyLogResult, LazyRedact};
use crate::router::MethodHandler;

pub struct CallToolHandler {
    tool_manager: Arc<ToolManager>,
}

impl CallToolHandler {
    pub fn new(tool_manager: Arc<ToolManager>) -> Self {
        Self { tool_manager }
    }
}

#[async_trait]
impl MethodHandler for CallToolHandler {
    async fn handle(&self, ctx: ExecutionContext, params: Value) -> Result<Value, CoreError> {
        let tool_id = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::InvalidArgument("missing tool name".to_string()))?
            .to_string();
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let raw_inputs = serde_json::to_vec(&arguments).unwrap_or_default();

        // Step 1: resolve (permitted to miss; the manager may still route by id).
        let resolved = self.tool_manager.get(&tool_id);

        // Step 2: authorize. Deny only when a profile is present and the
        // resolved tool's service is not in its allow-list. An unhealthy
        // service is rejected regardless of profile.
        if let Some(tool) = resolved.as_ref() {
            let service_id = &tool.describe().service_id;
            if !self.tool_manager.is_service_healthy(service_id) {
                return Err(CoreError::Unhealthy(format!("service {service_id} is unhealthy")));
            }
            if let Some(profile) = ctx.profile_id.as_deref() {
                if !self.tool_manager.is_service_allowed(service_id, Some(profile)) {
                    return Err(CoreError::AccessDenied(format!(
                        "profile {profile} cannot call tools on service {service_id}"
                    )));
                }
            }
        }

        // Step 3: log entrance with lazily-redacted arguments.
        tracing::info!(tool = %tool_id, arguments = %LazyRedact::new(&raw_inputs), "tool call entered");

        // Step 4: meter.
        let service_id = resolved
            .as_ref()
            .map(|t| t.describe().service_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        tools_call_total(&tool_id, &service_id);
        let _timer = CallTimer::start(tool_id.clone(), service_id.clone());

        // Step 5: dispatch.
        let req = ExecutionRequest::new(tool_id.clone(), raw_inputs);
        let outcome = match self.tool_manager.execute_tool(ctx, req).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Step 6: on error.
                tools_call_errors(&tool_id, &service_id);
                tracing::info!(tool = %tool_id, error = %err, "tool call failed");
                return Err(err);
            }
        };

        // Step 7: coerce.
        let coerced = coerce(outcome.clone());

        // Step 8: log completion with the summarized result, reusing
        // the fallback's marshaled bytes rather than marshaling again.
        let log_result = LazyLogResult::with_marshaled(&outcome, coerced.marshaled.as_deref());
        tracing::info!(tool = %tool_id, result = %log_result, "tool call completed");

        serde_json::to_value(&coerced.result)
            .map_err(|e| CoreError::Other(anyhow::anyhow!("failed to encode result: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcprouter_core::testing::{descriptor, StaticTool};
    use mcprouter_core::ToolOutcome;
    use mcprouter_managers::MiddlewarePipeline;

    fn manager_with_echo() -> Arc<ToolManager> {
        let mgr = Arc::new(ToolManager::new(MiddlewarePipeline::new(vec![])));
        mgr.add(Arc::new(StaticTool::returning(
            descriptor("svc", "echo"),
            ToolOutcome::Other(serde_json::json!({"ok": true})),
        )));
        mgr
    }

    #[tokio::test]
    async fn call_tool_resolves_executes_and_coerces() {
        let handler = CallToolHandler::new(manager_with_echo());
        let out = handler
            .handle(
                ExecutionContext::default(),
                serde_json::json!({"name": "svc.echo", "arguments": {}}),
            )
            .await
            .unwrap();
        assert!(out.get("content").is_some());
    }

    #[tokio::test]
    async fn call_tool_missing_name_is_invalid_argument() {
        let handler = CallToolHandler::new(manager_with_echo());
        let err = handler
            .handle(ExecutionContext::default(), serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn call_tool_rejects_unhealthy_service() {
        let mgr = manager_with_echo();
        mgr.add_service_info(mcprouter_core::ServiceInfo {
            service_id: "svc".into(),
            name: "svc".into(),
            config: serde_json::json!({}),
            health_status: mcprouter_core::HealthStatus::Healthy,
        });
        mgr.set_service_health("svc", mcprouter_core::HealthStatus::Unhealthy);
        let handler = CallToolHandler::new(mgr);

        let err = handler
            .handle(
                ExecutionContext::default(),
                serde_json::json!({"name": "svc.echo", "arguments": {}}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unhealthy(_)));
    }

    #[tokio::test]
    async fn call_tool_denies_when_profile_excludes_service() {
        let mgr = manager_with_echo();
        let mut profiles = std::collections::HashMap::new();
        profiles.insert(
            "p1".to_string(),
            mcprouter_core::Profile {
                name: "p1".into(),
                per_service: std::collections::HashMap::new(),
            },
        );
        mgr.set_profiles(profiles);
        let handler = CallToolHandler::new(mgr);

        let ctx = ExecutionContext {
            profile_id: Some("p1".to_string()),
            ..Default::default()
        };
        let err = handler
            .handle(ctx, serde_json::json!({"name": "svc.echo", "arguments": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccessDenied(_)));
    }
}
