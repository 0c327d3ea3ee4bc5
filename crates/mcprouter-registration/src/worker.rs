// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The worker consuming registration/query requests off the bus (spec
//! §4.7): "Workers scale horizontally on the bus; the server is
//! oblivious to which worker handled its request."

use std::sync::Arc;
use std::time::Duration;

use mcprouter_bus::{Envelope, MessageBus};
use mcprouter_core::HealthStatus;
use mcprouter_managers::ToolManager;
use serde_json::json;
use tracing::{info, warn};

use crate::catalog::ServiceCatalog;
use crate::discoverer::{DiscoveryResult, ServiceConfigInput, ServiceDiscoverer};
use crate::topics;

/// Default interval between health-check passes over every registered
/// service.
const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Consumes `service_registration_requests` (and the `GetService` /
/// `ListServices` query topics), performs discovery or a catalog
/// lookup, and publishes the correlated result. Any number of workers
/// may run concurrently against the same bus. It also owns the
/// periodic health-check pass that transitions a service's
/// `HealthStatus` (spec §3/§7): re-running discovery against each
/// registered service and recording whether it still succeeds.
pub struct RegistrationWorker {
    bus: Arc<dyn MessageBus>,
    discoverer: Arc<dyn ServiceDiscoverer>,
    catalog: Arc<dyn ServiceCatalog>,
    /// The live tool catalog's `ServiceInfo` table, kept in sync with
    /// health-check outcomes so `CallTool`/list-filtering see the same
    /// status `GetService`/`ListServices` report. `None` when no
    /// router instance was wired in (e.g. a bare registration-only
    /// deployment).
    tool_manager: Option<Arc<ToolManager>>,
    health_check_interval: Duration,
}

impl RegistrationWorker {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        discoverer: Arc<dyn ServiceDiscoverer>,
        catalog: Arc<dyn ServiceCatalog>,
    ) -> Self {
        Self {
            bus,
            discoverer,
            catalog,
            tool_manager: None,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        }
    }

    /// Keep the router's own `ServiceInfo` table (in `ToolManager`) in
    /// sync with health-check outcomes.
    pub fn with_tool_manager(mut self, tool_manager: Arc<ToolManager>) -> Self {
        self.tool_manager = Some(tool_manager);
        self
    }

    /// Run all consumption loops until their subscriptions close (the
    /// bus is dropped). Intended to be spawned as a background task.
    pub async fn run(self: Arc<Self>) {
        let registration = {
            let this = self.clone();
            tokio::spawn(async move { this.run_registration_loop().await })
        };
        let get = {
            let this = self.clone();
            tokio::spawn(async move { this.run_get_loop().await })
        };
        let list = {
            let this = self.clone();
            tokio::spawn(async move { this.run_list_loop().await })
        };
        let health = {
            let this = self.clone();
            tokio::spawn(async move { this.run_health_check_loop().await })
        };
        let _ = tokio::join!(registration, get, list, health);
    }

    async fn run_health_check_loop(&self) {
        let mut interval = tokio::time::interval(self.health_check_interval);
        loop {
            interval.tick().await;
            self.run_health_check_once().await;
        }
    }

    /// One health-check pass over every registered service: re-runs
    /// discovery against each service's stored config and records
    /// whether it still succeeds, in both the service catalog and (if
    /// wired) the live `ToolManager`.
    pub async fn run_health_check_once(&self) {
        for info in self.catalog.list().await {
            let config = ServiceConfigInput {
                service_id: info.service_id.clone(),
                name: info.name.clone(),
                config: info.config.clone(),
            };
            let status = match self.discoverer.discover(&config).await {
                Ok(_) => HealthStatus::Healthy,
                Err(e) => {
                    warn!(service_id = %info.service_id, error = %e, "health check failed");
                    HealthStatus::Unhealthy
                }
            };
            let mut updated = info.clone();
            updated.health_status = status;
            self.catalog.record(updated).await;
            if let Some(tool_manager) = &self.tool_manager {
                tool_manager.set_service_health(&info.service_id, status);
            }
        }
    }

    async fn run_registration_loop(&self) {
        let mut subscription = self.bus.subscribe(topics::SERVICE_REGISTRATION_REQUESTS).await;
        while let Some(envelope) = subscription.recv().await {
            self.handle_registration_request(envelope).await;
        }
    }

    async fn handle_registration_request(&self, envelope: Envelope) {
        let Some(correlation_id) = envelope.correlation_id.clone() else {
            warn!("registration request missing correlation id, dropping");
            return;
        };
        let config = match serde_json::from_value::<WireServiceConfig>(envelope.payload) {
            Ok(config) => config.into_input(),
            Err(e) => {
                self.publish_registration_result(
                    &correlation_id,
                    Err(format!("malformed registration request: {e}")),
                );
                return;
            }
        };

        let result = self.discoverer.discover(&config).await;
        match result {
            Ok(discovery) => {
                self.catalog
                    .record(mcprouter_core::ServiceInfo {
                        service_id: discovery.service_key.clone(),
                        name: config.name.clone(),
                        config: config.config.clone(),
                        health_status: HealthStatus::Healthy,
                    })
                    .await;
                info!(service_key = %discovery.service_key, "service registered");
                self.publish_registration_result(&correlation_id, Ok(discovery));
            }
            Err(e) => self.publish_registration_result(&correlation_id, Err(e.to_string())),
        }
    }

    fn publish_registration_result(&self, correlation_id: &str, result: Result<DiscoveryResult, String>) {
        let payload = match result {
            Ok(discovery) => json!({
                "ok": true,
                "service_key": discovery.service_key,
                "message": discovery.message,
                "discovered_tools": discovery.discovered_tools,
                "discovered_resources": discovery.discovered_resources,
            }),
            Err(message) => json!({ "ok": false, "message": message }),
        };
        self.bus.publish(Envelope::with_correlation(
            topics::SERVICE_REGISTRATION_RESULTS,
            correlation_id,
            payload,
        ));
    }

    async fn run_get_loop(&self) {
        let mut subscription = self.bus.subscribe(topics::SERVICE_GET_REQUESTS).await;
        while let Some(envelope) = subscription.recv().await {
            let Some(correlation_id) = envelope.correlation_id.clone() else {
                continue;
            };
            let name = envelope.payload.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            let found = self.catalog.get(name).await;
            self.bus.publish(Envelope::with_correlation(
                topics::SERVICE_GET_RESULTS,
                correlation_id,
                json!({ "service": found }),
            ));
        }
    }

    async fn run_list_loop(&self) {
        let mut subscription = self.bus.subscribe(topics::SERVICE_LIST_REQUESTS).await;
        while let Some(envelope) = subscription.recv().await {
            let Some(correlation_id) = envelope.correlation_id.clone() else {
                continue;
            };
            let services = self.catalog.list().await;
            self.bus.publish(Envelope::with_correlation(
                topics::SERVICE_LIST_RESULTS,
                correlation_id,
                json!({ "services": services }),
            ));
        }
    }
}

/// Wire shape of a registration request's payload, mirroring
/// `proto::ServiceConfig` but traveling as bus JSON rather than
/// protobuf bytes.
#[derive(Debug, serde::Deserialize)]
struct WireServiceConfig {
    service_id: String,
    name: String,
    #[serde(default)]
    config: serde_json::Value,
}

impl WireServiceConfig {
    fn into_input(self) -> ServiceConfigInput {
        ServiceConfigInput {
            service_id: self.service_id,
            name: self.name,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryServiceCatalog;
    use crate::testing::{FailingDiscoverer, StaticDiscoverer};
    use mcprouter_bus::InMemoryBus;
    use mcprouter_managers::MiddlewarePipeline;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn registration_round_trip_publishes_correlated_result() {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let catalog = Arc::new(InMemoryServiceCatalog::new());
        let discoverer = Arc::new(StaticDiscoverer::with_service_key("svc-key"));
        let worker = Arc::new(RegistrationWorker::new(bus.clone(), discoverer, catalog.clone()));
        tokio::spawn(worker.run());

        // Give the worker's subscriptions time to attach before publishing.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let cancel = CancellationToken::new();
        let bus_for_wait = bus.clone();
        let waiter = tokio::spawn(async move {
            bus_for_wait
                .subscribe_once(topics::SERVICE_REGISTRATION_RESULTS, "corr-1", cancel)
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        bus.publish(Envelope::with_correlation(
            topics::SERVICE_REGISTRATION_REQUESTS,
            "corr-1",
            json!({ "service_id": "svc", "name": "Service", "config": {} }),
        ));

        let result = waiter.await.unwrap().expect("result published");
        assert_eq!(result.payload["service_key"], "svc-key");
        assert!(catalog.get("svc-key").await.is_some());
    }

    #[tokio::test]
    async fn health_check_marks_a_failing_service_unhealthy_and_back() {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let catalog = Arc::new(InMemoryServiceCatalog::new());
        catalog
            .record(mcprouter_core::ServiceInfo {
                service_id: "svc".into(),
                name: "Service".into(),
                config: json!({}),
                health_status: HealthStatus::Healthy,
            })
            .await;

        let tool_manager = Arc::new(ToolManager::new(MiddlewarePipeline::new(vec![])));
        tool_manager.add_service_info(mcprouter_core::ServiceInfo {
            service_id: "svc".into(),
            name: "Service".into(),
            config: json!({}),
            health_status: HealthStatus::Healthy,
        });

        let failing: Arc<dyn ServiceDiscoverer> = Arc::new(FailingDiscoverer::new("unreachable"));
        let worker = RegistrationWorker::new(bus.clone(), failing, catalog.clone())
            .with_tool_manager(tool_manager.clone());
        worker.run_health_check_once().await;

        assert_eq!(
            catalog.get("svc").await.unwrap().health_status,
            HealthStatus::Unhealthy
        );
        assert!(!tool_manager.is_service_healthy("svc"));

        let healthy: Arc<dyn ServiceDiscoverer> = Arc::new(StaticDiscoverer::with_service_key("svc"));
        let worker = RegistrationWorker::new(bus, healthy, catalog.clone()).with_tool_manager(tool_manager.clone());
        worker.run_health_check_once().await;

        assert_eq!(catalog.get("svc").await.unwrap().health_status, HealthStatus::Healthy);
        assert!(tool_manager.is_service_healthy("svc"));
    }
}
