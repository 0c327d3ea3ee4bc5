// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `resources/read`: resolve the resource by URI,
//! authorize against the caller's profile, then read it. Skill
//! resources (`skills://...`) and any other resource kind share this
//! single handler — each resource in the manager carries its own
//! `ResourceReader`, so the handler never needs to branch on URI
//! scheme itself.

use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext};
use mcprouter_managers::{ResourceManager, ToolManager};
use serde_json::Value;

use crate::router::MethodHandler;

pub struct ReadResourceHandler {
    resource_manager: Arc<ResourceManager>,
    tool_manager: Arc<ToolManager>,
}

impl ReadResourceHandler {
    pub fn new(resource_manager: Arc<ResourceManager>, tool_manager: Arc<ToolManager>) -> Self {
        Self {
            resource_manager,
            tool_manager,
        }
    }
}

#[async_trait]
impl MethodHandler for ReadResourceHandler {
    async fn handle(&self, ctx: ExecutionContext, params: Value) -> Result<Value, CoreError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::InvalidArgument("missing resource uri".to_string()))?
            .to_string();

        let resource = self
            .resource_manager
            .get(&uri)
            .ok_or_else(|| CoreError::NotFound(format!("no resource registered for uri {uri}")))?;

        if !self.tool_manager.is_service_healthy(&resource.service_id) {
            return Err(CoreError::Unhealthy(format!(
                "service {} is unhealthy",
                resource.service_id
            )));
        }

        if let Some(profile) = ctx.profile_id.as_deref() {
            if !self
                .tool_manager
                .is_service_allowed(&resource.service_id, Some(profile))
            {
                return Err(CoreError::AccessDenied(format!(
                    "profile {profile} cannot read resources on service {}",
                    resource.service_id
                )));
            }
        }

        let contents = self.resource_manager.read(ctx, &uri).await?;
        let mut wire = serde_json::json!({
            "uri": contents.uri,
            "mimeType": contents.mime_type,
        });
        if let Some(text) = contents.text {
            wire["text"] = Value::String(text);
        }
        if let Some(blob) = contents.blob {
            wire["blob"] = Value::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                blob,
            ));
        }

        Ok(serde_json::json!({ "contents": [wire] }))
    }
}
