// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The `TemporaryToolManager` used by `ValidateService`:
//! accepts `AddServiceInfo`, returns it on `GetServiceInfo`, and
//! discards everything on drop — it never touches the real catalogs.

use dashmap::DashMap;
use mcprouter_core::ServiceInfo;

#[derive(Default)]
pub struct TemporaryToolManager {
    service_info: DashMap<String, ServiceInfo>,
}

impl TemporaryToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_service_info(&self, info: ServiceInfo) {
        self.service_info.insert(info.service_id.clone(), info);
    }

    pub fn get_service_info(&self, service_id: &str) -> Option<ServiceInfo> {
        self.service_info.get(service_id).map(|e| e.value().clone())
    }

    pub fn list_service_info(&self) -> Vec<ServiceInfo> {
        self.service_info.iter().map(|e| e.value().clone()).collect()
    }
}

// Dropping `TemporaryToolManager` drops its `DashMap` along with it;
// there is no registration with any global catalog to unwind, which is
// what makes it safe for `ValidateService`'s discovery-then-discard flow.

#[cfg(test)]
mod tests {
    use super::*;
    use mcprouter_core::HealthStatus;
    use serde_json::json;

    #[test]
    fn discovered_service_info_is_retrievable_but_scoped_to_this_instance() {
        let mgr = TemporaryToolManager::new();
        mgr.add_service_info(ServiceInfo {
            service_id: "svc".into(),
            name: "Service".into(),
            config: json!({}),
            health_status: HealthStatus::Unknown,
        });
        assert!(mgr.get_service_info("svc").is_some());
        assert_eq!(mgr.list_service_info().len(), 1);

        drop(mgr);
        // A freshly constructed manager starts empty; nothing leaked.
        let other = TemporaryToolManager::new();
        assert!(other.get_service_info("svc").is_none());
    }
}
