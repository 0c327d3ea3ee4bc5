// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The discovery seam the registration pipeline calls into.
//!
//! Connecting to a real upstream (HTTP/gRPC/OpenAPI/WebSocket/command)
//! and enumerating its tools and resources is out of scope for this
//! workspace — [`ServiceDiscoverer`] is the trait a concrete
//! connector implements, mirroring `mcprouter_core::UpstreamTool` being
//! the seam for execution.

use async_trait::async_trait;
use mcprouter_core::{CoreError, Resource, Tool};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proto;

/// The syntactic shape of a service config, already validated and
/// deserialized out of the wire `ServiceConfig` message.
#[derive(Debug, Clone)]
pub struct ServiceConfigInput {
    /// Caller-proposed service id. The discoverer may return a
    /// different `service_key` once discovery assigns the canonical one.
    pub service_id: String,
    /// Human-facing service name.
    pub name: String,
    /// Opaque, transport-specific configuration.
    pub config: Value,
}

impl ServiceConfigInput {
    /// Validate the syntactic shape of a wire `ServiceConfig` (spec
    /// §4.7 step 1: "Validate the config's syntactic shape
    /// synchronously. If invalid → `InvalidArgument`").
    pub fn from_proto(config: Option<proto::ServiceConfig>) -> Result<Self, CoreError> {
        let config = config.ok_or_else(|| CoreError::InvalidArgument("missing config".into()))?;
        if config.service_id.trim().is_empty() {
            return Err(CoreError::InvalidArgument("service_id is required".into()));
        }
        if config.name.trim().is_empty() {
            return Err(CoreError::InvalidArgument("name is required".into()));
        }
        let value: Value = if config.config_json.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&config.config_json).map_err(|e| {
                CoreError::InvalidArgument(format!("config_json is not valid JSON: {e}"))
            })?
        };
        Ok(Self {
            service_id: config.service_id,
            name: config.name,
            config: value,
        })
    }
}

/// What a discovery run found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Canonical id assigned to the service, which may differ from the
    /// caller-proposed `service_id`.
    pub service_key: String,
    /// Tools discovered on the upstream.
    pub discovered_tools: Vec<Tool>,
    /// Resources discovered on the upstream.
    pub discovered_resources: Vec<Resource>,
    /// Human-facing status message.
    pub message: String,
}

impl DiscoveryResult {
    pub(crate) fn to_proto_tools(&self) -> Vec<proto::ToolDescriptor> {
        self.discovered_tools
            .iter()
            .map(|t| proto::ToolDescriptor {
                name: t.name.clone(),
                display_name: t.display_name.clone(),
                description: t.description.clone(),
                input_schema_json: t.input_schema.to_string(),
            })
            .collect()
    }

    pub(crate) fn to_proto_resources(&self) -> Vec<proto::ResourceDescriptor> {
        self.discovered_resources
            .iter()
            .map(|r| proto::ResourceDescriptor {
                uri: r.uri.clone(),
                mime_type: r.mime_type.clone(),
                description: r.description.clone(),
            })
            .collect()
    }
}

/// Connects to an upstream and enumerates what it offers. Implemented
/// once per transport kind by a concrete connector outside this crate.
#[async_trait]
pub trait ServiceDiscoverer: Send + Sync {
    async fn discover(&self, config: &ServiceConfigInput) -> Result<DiscoveryResult, CoreError>;
}
