// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The built-in `mcp:list_roots` tool, registered under
//! the synthetic service id `builtin`. It declares no caching and
//! simply forwards to the active session's `ListRoots`.

use async_trait::async_trait;
use mcprouter_core::{
    CoreError, ExecutionContext, ExecutionRequest, ToolDescriptor, ToolOutcome, UpstreamTool,
};

use crate::session::SessionRegistry;

pub const BUILTIN_SERVICE_ID: &str = "builtin";
pub const LIST_ROOTS_TOOL_NAME: &str = "list_roots";

pub struct ListRootsTool {
    descriptor: ToolDescriptor,
    sessions: SessionRegistry,
}

impl ListRootsTool {
    pub fn new(sessions: SessionRegistry) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: LIST_ROOTS_TOOL_NAME.to_string(),
                service_id: BUILTIN_SERVICE_ID.to_string(),
                display_name: "List Roots".to_string(),
                description: "Lists the connecting client's file-system roots.".to_string(),
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            },
            sessions,
        }
    }
}

#[async_trait]
impl UpstreamTool for ListRootsTool {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        _req: ExecutionRequest,
    ) -> Result<ToolOutcome, CoreError> {
        let session = self.sessions.get()?;
        let roots = session.list_roots().await?;
        let value = serde_json::to_value(roots)
            .map_err(|e| CoreError::Other(anyhow::anyhow!("failed to encode roots: {e}")))?;
        Ok(ToolOutcome::Other(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_no_caching() {
        let tool = ListRootsTool::new(SessionRegistry::default());
        assert!(tool.cache_config().is_none());
    }

    #[test]
    fn composite_id_is_builtin_list_roots() {
        let tool = ListRootsTool::new(SessionRegistry::default());
        assert_eq!(tool.describe().service_id, BUILTIN_SERVICE_ID);
        assert_eq!(tool.describe().name, LIST_ROOTS_TOOL_NAME);
    }
}
