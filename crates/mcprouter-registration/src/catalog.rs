// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The record of registered services `GetService`/`ListServices`
//! answer from, kept separate from the tool/prompt/resource catalogs
//! in `mcprouter-managers` since this is metadata about services
//! themselves rather than their callables.

use async_trait::async_trait;
use dashmap::DashMap;
use mcprouter_core::ServiceInfo;

/// Where registered service metadata lives between a successful
/// `RegisterService` and later `GetService`/`ListServices` calls.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Record (or replace) a service's metadata.
    async fn record(&self, info: ServiceInfo);
    /// Look up a single service by id.
    async fn get(&self, service_id: &str) -> Option<ServiceInfo>;
    /// Snapshot every registered service.
    async fn list(&self) -> Vec<ServiceInfo>;
}

/// The default, single-process [`ServiceCatalog`], backed by a
/// `DashMap` for the same lock-free-read discipline the rest of the
/// workspace's catalogs use.
#[derive(Default)]
pub struct InMemoryServiceCatalog {
    services: DashMap<String, ServiceInfo>,
}

impl InMemoryServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryServiceCatalog {
    async fn record(&self, info: ServiceInfo) {
        self.services.insert(info.service_id.clone(), info);
    }

    async fn get(&self, service_id: &str) -> Option<ServiceInfo> {
        self.services.get(service_id).map(|e| e.value().clone())
    }

    async fn list(&self) -> Vec<ServiceInfo> {
        self.services.iter().map(|e| e.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcprouter_core::HealthStatus;
    use serde_json::json;

    fn info(id: &str) -> ServiceInfo {
        ServiceInfo {
            service_id: id.into(),
            name: id.into(),
            config: json!({}),
            health_status: HealthStatus::Healthy,
        }
    }

    #[tokio::test]
    async fn records_and_lists_services() {
        let catalog = InMemoryServiceCatalog::new();
        catalog.record(info("a")).await;
        catalog.record(info("b")).await;

        assert!(catalog.get("a").await.is_some());
        assert!(catalog.get("missing").await.is_none());
        assert_eq!(catalog.list().await.len(), 2);
    }

    #[tokio::test]
    async fn re_recording_a_service_replaces_it() {
        let catalog = InMemoryServiceCatalog::new();
        catalog.record(info("a")).await;
        let mut updated = info("a");
        updated.health_status = HealthStatus::Unhealthy;
        catalog.record(updated).await;

        assert_eq!(catalog.list().await.len(), 1);
        assert_eq!(catalog.get("a").await.unwrap().health_status, HealthStatus::Unhealthy);
    }
}
