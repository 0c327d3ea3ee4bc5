// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `ValidateService`: the synchronous cousin of the registration
//! pipeline. Runs discovery against a temporary manager
//! stand-in that is dropped at the end of the call, touching none of
//! the real catalogs.

use mcprouter_core::CoreError;
use mcprouter_managers::{NoOpPromptManager, NoOpResourceManager, TemporaryToolManager};

use crate::discoverer::{DiscoveryResult, ServiceConfigInput, ServiceDiscoverer};

/// Outcome of a validation run. Unlike every other registration RPC,
/// `valid = false` is not itself an error — only a malformed request fails this function.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
    pub discovery: DiscoveryResult,
}

/// Run discovery against a scratch `TemporaryToolManager` plus `NoOp`
/// prompt/resource managers, returning what was discovered without any
/// of it reaching the real catalogs.
pub async fn validate_service(
    config: &ServiceConfigInput,
    discoverer: &dyn ServiceDiscoverer,
) -> Result<ValidationOutcome, CoreError> {
    // Scoped so it's plain to see these never escape this function;
    // nothing here is shared with the caller.
    let temp_tools = TemporaryToolManager::new();
    let _temp_prompts = NoOpPromptManager;
    let _temp_resources = NoOpResourceManager;

    match discoverer.discover(config).await {
        Ok(discovery) => {
            temp_tools.add_service_info(mcprouter_core::ServiceInfo {
                service_id: discovery.service_key.clone(),
                name: config.name.clone(),
                config: config.config.clone(),
                health_status: mcprouter_core::HealthStatus::Healthy,
            });
            Ok(ValidationOutcome {
                valid: true,
                message: discovery.message.clone(),
                discovery,
            })
        }
        Err(err) => Ok(ValidationOutcome {
            valid: false,
            message: err.to_string(),
            discovery: DiscoveryResult::default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingDiscoverer, StaticDiscoverer};

    fn config() -> ServiceConfigInput {
        ServiceConfigInput {
            service_id: "svc".into(),
            name: "Service".into(),
            config: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn successful_discovery_is_valid() {
        let discoverer = StaticDiscoverer::with_service_key("svc-1");
        let outcome = validate_service(&config(), &discoverer).await.unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.discovery.service_key, "svc-1");
    }

    #[tokio::test]
    async fn failed_discovery_is_invalid_but_not_an_error() {
        let discoverer = FailingDiscoverer::new("upstream unreachable");
        let outcome = validate_service(&config(), &discoverer).await.unwrap();
        assert!(!outcome.valid);
        assert!(outcome.message.contains("upstream unreachable"));
    }
}
