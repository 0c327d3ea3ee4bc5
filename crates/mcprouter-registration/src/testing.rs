// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Test doubles for [`crate::ServiceDiscoverer`], mirroring the
//! `mcprouter_core::testing::StaticTool` pattern: exercise the
//! registration pipeline without a real upstream.

use async_trait::async_trait;
use mcprouter_core::CoreError;

use crate::discoverer::{DiscoveryResult, ServiceConfigInput, ServiceDiscoverer};

/// A discoverer that always succeeds with a fixed `service_key` and no
/// discovered tools/resources.
pub struct StaticDiscoverer {
    service_key: String,
}

impl StaticDiscoverer {
    pub fn with_service_key(service_key: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
        }
    }
}

#[async_trait]
impl ServiceDiscoverer for StaticDiscoverer {
    async fn discover(&self, _config: &ServiceConfigInput) -> Result<DiscoveryResult, CoreError> {
        Ok(DiscoveryResult {
            service_key: self.service_key.clone(),
            discovered_tools: Vec::new(),
            discovered_resources: Vec::new(),
            message: "ok".into(),
        })
    }
}

/// A discoverer that always fails with `CoreError::Upstream(reason)`.
pub struct FailingDiscoverer {
    reason: String,
}

impl FailingDiscoverer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ServiceDiscoverer for FailingDiscoverer {
    async fn discover(&self, _config: &ServiceConfigInput) -> Result<DiscoveryResult, CoreError> {
        Err(CoreError::Upstream(self.reason.clone()))
    }
}
