// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The `PromptEvaluator` capability: the `evaluate(arguments) →
//! messages` half of the Prompt type. Mirrors `UpstreamTool` — one
//! instance per registered prompt, closing over whatever upstream
//! actually renders the template.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::tool::ExecutionContext;

/// Who a rendered prompt message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    User,
    Assistant,
}

/// A single rendered message, domain-local rather than tied to the
/// MCP wire shape — `mcprouter-server` converts these to the
/// `GetPromptResult` JSON shape at the boundary, the same way
/// `mcprouter-core::ResourceContents` is converted to `rmcp`'s
/// resource-contents enum in `coercion.rs` rather than being that
/// type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub text: String,
}

/// Renders a prompt template into a sequence of messages. Concrete
/// upstream-backed implementations are out of scope for this
/// workspace; `mcprouter-core::testing` ships an in-memory
/// double for exercising the manager and server layers.
#[async_trait]
pub trait PromptEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        ctx: ExecutionContext,
        arguments: Value,
    ) -> Result<Vec<PromptMessage>, CoreError>;
}
