// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Catalog data model.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::composite_tool_id;

/// Cache behavior attached to a tool or a sampling call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time a cached entry remains valid.
    pub ttl: Duration,
}

impl CacheConfig {
    /// Default sampler TTL: 5 minutes when a tool doesn't set its own.
    pub fn default_sampler() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// An addressable callable exposed by an upstream service.
///
/// `rmcp_view` is the MCP-facing projection; it and any
/// protobuf/admin-surface view are both derived from this same struct
/// rather than kept as independent copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Name stable within the owning service (pre-sanitization).
    pub name: String,
    /// Owning upstream service id.
    pub service_id: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Human-facing description.
    pub description: String,
    /// JSON Schema object describing the tool's input.
    pub input_schema: Value,
    /// Optional cache behavior for this tool's results.
    pub cache_config: Option<CacheConfig>,
}

impl Tool {
    /// The externally visible composite id, `"<service_id>.<sanitized(name)>"`.
    pub fn composite_id(&self) -> String {
        composite_tool_id(&self.service_id, &self.name)
    }

    /// Project this tool into an `rmcp` `Tool`. Returns `None` only if
    /// the input schema is not a JSON object, which the MCP wire format
    /// requires (invariant (iii): no tool with a nil view is exposed).
    pub fn to_mcp_tool(&self) -> Option<rmcp::model::Tool> {
        let schema = self.input_schema.as_object()?.clone();
        Some(rmcp::model::Tool {
            name: self.composite_id().into(),
            description: Some(self.description.clone().into()),
            input_schema: std::sync::Arc::new(schema),
            output_schema: None,
            annotations: None,
        })
    }
}

/// A prompt template exposed by an upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Name stable within the owning service.
    pub name: String,
    /// Owning upstream service id.
    pub service_id: String,
    /// JSON Schema describing the arguments `evaluate` accepts.
    pub argument_schema: Value,
}

impl Prompt {
    /// The externally visible composite id.
    pub fn composite_id(&self) -> String {
        composite_tool_id(&self.service_id, &self.name)
    }
}

/// Read-only content addressed by URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Globally unique, opaque URI.
    pub uri: String,
    /// Owning upstream service id.
    pub service_id: String,
    /// MIME type of the resource content.
    pub mime_type: String,
    /// Human-facing description.
    pub description: String,
}

/// The content read back from a `Resource::read()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContents {
    /// The resource's URI.
    pub uri: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Populated when the content is text-like.
    pub text: Option<String>,
    /// Populated when the content is binary.
    pub blob: Option<Vec<u8>>,
}

/// Health of a registered upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Service is reachable and passing health checks.
    Healthy,
    /// Service failed a health check.
    Unhealthy,
    /// No health check has run yet.
    Unknown,
}

/// Metadata about a registered upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Unique service id.
    pub service_id: String,
    /// Human-facing service name.
    pub name: String,
    /// Opaque service configuration (transport-specific).
    pub config: Value,
    /// Current health status.
    pub health_status: HealthStatus,
}

/// Per-service visibility within a [`Profile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileTools {
    /// Whether the service itself is visible under this profile.
    pub enabled: bool,
    /// Per-tool overrides keyed by the tool's bare (unsanitized) name.
    #[serde(default)]
    pub tools: HashMap<String, ToolOverride>,
}

/// A single tool's visibility override within a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOverride {
    /// When true, the tool is hidden even though its service is enabled.
    #[serde(default)]
    pub disabled: bool,
}

/// A named visibility/authorization policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name.
    pub name: String,
    /// Per-service visibility rules, keyed by `service_id`.
    pub per_service: HashMap<String, ProfileTools>,
}

impl Profile {
    /// Service ids visible under this profile.
    pub fn allowed_service_ids(&self) -> HashSet<String> {
        self.per_service
            .iter()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether a specific tool (by bare name) is visible under this
    /// profile, assuming its service is enabled.
    pub fn tool_allowed(&self, service_id: &str, tool_name: &str) -> bool {
        match self.per_service.get(service_id) {
            Some(cfg) if cfg.enabled => !cfg
                .tools
                .get(tool_name)
                .map(|o| o.disabled)
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// A single `CallTool` request as it flows through the server.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// The composite tool id requested by the caller.
    pub tool_id: String,
    /// Raw, not-yet-parsed JSON arguments.
    pub tool_inputs: Vec<u8>,
    /// The resolved tool, if the manager found one for `tool_id`.
    pub tool: Option<Tool>,
    /// Whether this is a dry run (stripped from `tool_inputs` if present).
    pub dry_run: bool,
}

impl ExecutionRequest {
    /// Build a request from a composite id and raw argument bytes,
    /// stripping and consuming a top-level `"_dry_run": true` key if
    /// present.
    pub fn new(tool_id: impl Into<String>, tool_inputs: Vec<u8>) -> Self {
        let (tool_inputs, dry_run) = strip_dry_run(tool_inputs);
        Self {
            tool_id: tool_id.into(),
            tool_inputs,
            tool: None,
            dry_run,
        }
    }
}

fn strip_dry_run(raw: Vec<u8>) -> (Vec<u8>, bool) {
    let Ok(mut value) = serde_json::from_slice::<Value>(&raw) else {
        return (raw, false);
    };
    let Some(obj) = value.as_object_mut() else {
        return (raw, false);
    };
    let dry_run = matches!(obj.remove("_dry_run"), Some(Value::Bool(true)));
    if !dry_run {
        return (raw, false);
    }
    let rewritten = serde_json::to_vec(&value).unwrap_or(raw);
    (rewritten, true)
}
