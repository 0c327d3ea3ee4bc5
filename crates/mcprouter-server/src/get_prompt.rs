// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `prompts/get`: resolve the prompt by composite id,
//! authorize against the caller's profile the same way `CallTool`
//! does, then render it. Unlike `CallTool`, a rendering failure here
//! *is* surfaced as an RPC error — there is no "wrap upstream failure
//! into a successful-shaped result" rule for prompts, only for tools
//! (the `UpstreamError` carve-out names `CallToolResult`
//! specifically).

use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext};
use mcprouter_managers::{PromptManager, ToolManager};
use serde_json::Value;

use crate::router::MethodHandler;

pub struct GetPromptHandler {
    prompt_manager: Arc<PromptManager>,
    tool_manager: Arc<ToolManager>,
}

impl GetPromptHandler {
    pub fn new(prompt_manager: Arc<PromptManager>, tool_manager: Arc<ToolManager>) -> Self {
        Self {
            prompt_manager,
            tool_manager,
        }
    }
}

#[async_trait]
impl MethodHandler for GetPromptHandler {
    async fn handle(&self, ctx: ExecutionContext, params: Value) -> Result<Value, CoreError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::InvalidArgument("missing prompt name".to_string()))?
            .to_string();
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let prompt = self
            .prompt_manager
            .get(&name)
            .ok_or_else(|| CoreError::NotFound(format!("no prompt registered for id {name}")))?;

        if !self.tool_manager.is_service_healthy(&prompt.service_id) {
            return Err(CoreError::Unhealthy(format!(
                "service {} is unhealthy",
                prompt.service_id
            )));
        }

        if let Some(profile) = ctx.profile_id.as_deref() {
            if !self
                .tool_manager
                .is_service_allowed(&prompt.service_id, Some(profile))
            {
                return Err(CoreError::AccessDenied(format!(
                    "profile {profile} cannot access prompts on service {}",
                    prompt.service_id
                )));
            }
        }

        let messages = self.prompt_manager.evaluate(ctx, &name, arguments).await?;
        let wire_messages: Vec<Value> = messages
            .into_iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role,
                    "content": { "type": "text", "text": m.text },
                })
            })
            .collect();

        Ok(serde_json::json!({ "messages": wire_messages }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcprouter_core::testing::StaticPromptEvaluator;
    use mcprouter_core::{Prompt, PromptMessage, PromptRole};
    use mcprouter_managers::MiddlewarePipeline;

    fn manager_with_prompt() -> (Arc<PromptManager>, Arc<ToolManager>) {
        let prompts = Arc::new(PromptManager::new());
        prompts.add_with_evaluator(
            Prompt {
                name: "greet".into(),
                service_id: "svc".into(),
                argument_schema: serde_json::json!({}),
            },
            Arc::new(StaticPromptEvaluator::returning(vec![PromptMessage {
                role: PromptRole::User,
                text: "hi".into(),
            }])),
        );
        (prompts, Arc::new(ToolManager::new(MiddlewarePipeline::new(vec![]))))
    }

    #[tokio::test]
    async fn get_prompt_renders_registered_prompt() {
        let (prompts, tools) = manager_with_prompt();
        let handler = GetPromptHandler::new(prompts, tools);
        let out = handler
            .handle(
                ExecutionContext::default(),
                serde_json::json!({"name": "svc.greet", "arguments": {}}),
            )
            .await
            .unwrap();
        assert_eq!(out["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_prompt_missing_name_is_not_found() {
        let (prompts, tools) = manager_with_prompt();
        let handler = GetPromptHandler::new(prompts, tools);
        let err = handler
            .handle(
                ExecutionContext::default(),
                serde_json::json!({"name": "svc.missing"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_prompt_rejects_unhealthy_service() {
        let (prompts, tools) = manager_with_prompt();
        tools.add_service_info(mcprouter_core::ServiceInfo {
            service_id: "svc".into(),
            name: "svc".into(),
            config: serde_json::json!({}),
            health_status: mcprouter_core::HealthStatus::Healthy,
        });
        tools.set_service_health("svc", mcprouter_core::HealthStatus::Unhealthy);
        let handler = GetPromptHandler::new(prompts, tools);

        let err = handler
            .handle(
                ExecutionContext::default(),
                serde_json::json!({"name": "svc.greet", "arguments": {}}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unhealthy(_)));
    }

    #[tokio::test]
    async fn get_prompt_denies_when_profile_excludes_service() {
        let (prompts, tools) = manager_with_prompt();
        let mut profiles = std::collections::HashMap::new();
        profiles.insert(
            "p1".to_string(),
            mcprouter_core::Profile {
                name: "p1".into(),
                per_service: std::collections::HashMap::new(),
            },
        );
        tools.set_profiles(profiles);
        let handler = GetPromptHandler::new(prompts, tools);

        let ctx = ExecutionContext {
            profile_id: Some("p1".to_string()),
            ..Default::default()
        };
        let err = handler
            .handle(ctx, serde_json::json!({"name": "svc.greet", "arguments": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccessDenied(_)));
    }
}
