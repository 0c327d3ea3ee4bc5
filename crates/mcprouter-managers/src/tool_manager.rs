// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The tool catalog.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, Weak};

use dashmap::DashMap;
use mcprouter_core::{
    CoreError, ExecutionContext, ExecutionRequest, HealthStatus, Profile, ServiceInfo, ToolOutcome,
    UpstreamTool,
};

use crate::middleware::MiddlewarePipeline;
use crate::provider::{ListChangeKind, McpServerProvider};

/// Authoritative catalog of every tool across every registered
/// upstream service, plus the profile table used to filter it.
pub struct ToolManager {
    tools: DashMap<String, Arc<dyn UpstreamTool>>,
    service_info: DashMap<String, ServiceInfo>,
    profiles: RwLock<HashMap<String, Profile>>,
    server: RwLock<Option<Weak<dyn McpServerProvider>>>,
    pipeline: MiddlewarePipeline,
}

impl ToolManager {
    pub fn new(pipeline: MiddlewarePipeline) -> Self {
        Self {
            tools: DashMap::new(),
            service_info: DashMap::new(),
            profiles: RwLock::new(HashMap::new()),
            server: RwLock::new(None),
            pipeline,
        }
    }

    /// Register or overwrite a tool under its composite id.
    pub fn add(&self, tool: Arc<dyn UpstreamTool>) {
        let id = crate::composite_id_of(tool.describe());
        self.tools.insert(id, tool);
        self.notify(ListChangeKind::Tools);
    }

    pub fn get(&self, composite_id: &str) -> Option<Arc<dyn UpstreamTool>> {
        self.tools.get(composite_id).map(|e| e.value().clone())
    }

    /// Snapshot of every registered tool.
    pub fn list(&self) -> Vec<Arc<dyn UpstreamTool>> {
        self.tools.iter().map(|e| e.value().clone()).collect()
    }

    /// Snapshot of tools visible under `profile_name`, /// no profile in context returns everything; an unknown profile
    /// name denies everything (deny-by-default).
    pub fn list_for_profile(&self, profile_name: Option<&str>) -> Vec<Arc<dyn UpstreamTool>> {
        let Some(profile_name) = profile_name else {
            return self.list();
        };
        let profiles = self.profiles.read().unwrap();
        let Some(profile) = profiles.get(profile_name) else {
            return Vec::new();
        };
        self.tools
            .iter()
            .filter(|e| {
                let descriptor = e.value().describe();
                profile.tool_allowed(&descriptor.service_id, &descriptor.name)
            })
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn clear_for_service(&self, service_id: &str) {
        self.tools
            .retain(|_, tool| tool.describe().service_id != service_id);
        self.service_info.remove(service_id);
        self.notify(ListChangeKind::Tools);
    }

    pub fn set_mcp_server(&self, server: Weak<dyn McpServerProvider>) {
        *self.server.write().unwrap() = Some(server);
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

    /// Transition a registered service's health status (spec §3:
    /// "`ServiceInfo` ... marked unhealthy by health checks"). A
    /// service with no recorded `ServiceInfo` is left alone rather than
    /// inventing one, since nothing has claimed it yet.
    pub fn set_service_health(&self, service_id: &str, status: HealthStatus) {
        if let Some(mut entry) = self.service_info.get_mut(service_id) {
            entry.health_status = status;
        }
    }

    /// Invariant (i): a tool is only visible/callable if its
    /// `ServiceInfo` (when one is recorded at all) is not `Unhealthy`.
    /// A service with no recorded info is treated as healthy — nothing
    /// has health-checked it yet, so there is nothing to deny on.
    pub fn is_service_healthy(&self, service_id: &str) -> bool {
        self.service_info
            .get(service_id)
            .map(|info| info.health_status != HealthStatus::Unhealthy)
            .unwrap_or(true)
    }

    /// Atomically replace the entire profile table.
    pub fn set_profiles(&self, profiles: HashMap<String, Profile>) {
        *self.profiles.write().unwrap() = profiles;
    }

    pub fn is_service_allowed(&self, service_id: &str, profile_name: Option<&str>) -> bool {
        let Some(profile_name) = profile_name else {
            return true;
        };
        let profiles = self.profiles.read().unwrap();
        profiles
            .get(profile_name)
            .map(|p| p.allowed_service_ids().contains(service_id))
            .unwrap_or(false)
    }

    /// Returns the allowed service id set and whether `profile_name`
    /// was a known profile. The set is a snapshot, safe to iterate
    /// without holding any lock.
    pub fn get_allowed_service_ids(&self, profile_name: &str) -> (HashSet<String>, bool) {
        let profiles = self.profiles.read().unwrap();
        match profiles.get(profile_name) {
            Some(profile) => (profile.allowed_service_ids(), true),
            None => (HashSet::new(), false),
        }
    }

    /// Resolve, then dispatch through the middleware pipeline (the
    /// manager side of `CallTool`'s resolve and dispatch steps).
    pub async fn execute_tool(
        &self,
        ctx: ExecutionContext,
        mut req: ExecutionRequest,
    ) -> Result<ToolOutcome, CoreError> {
        let Some(tool) = self.get(&req.tool_id) else {
            return Err(CoreError::NotFound(format!(
                "no tool registered for id {}",
                req.tool_id
            )));
        };
        let service_id = &tool.describe().service_id;
        if !self.is_service_healthy(service_id) {
            return Err(CoreError::Unhealthy(format!("service {service_id} is unhealthy")));
        }
        req.tool = None; // resolved tool is carried by `tool`, not serialized back
        self.pipeline.dispatch(ctx, req, tool).await
    }

    fn notify(&self, kind: ListChangeKind) {
        if let Some(provider) = self.server.read().unwrap().as_ref().and_then(Weak::upgrade) {
            provider.notify_list_changed(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcprouter_core::testing::{descriptor, StaticTool};
    use mcprouter_core::ProfileTools;
    use serde_json::json;

    fn manager() -> ToolManager {
        ToolManager::new(MiddlewarePipeline::new(vec![]))
    }

    fn make_tool(service_id: &str, name: &str) -> Arc<dyn UpstreamTool> {
        Arc::new(StaticTool::returning(
            descriptor(service_id, name),
            ToolOutcome::Other(json!("ok")),
        ))
    }

    #[test]
    fn add_and_get_round_trip() {
        let mgr = manager();
        mgr.add(make_tool("svc", "echo"));
        assert!(mgr.get("svc.echo").is_some());
        assert!(mgr.get("svc.missing").is_none());
    }

    #[test]
    fn clear_for_service_removes_only_that_services_tools() {
        let mgr = manager();
        mgr.add(make_tool("a", "one"));
        mgr.add(make_tool("b", "two"));
        mgr.clear_for_service("a");
        assert!(mgr.get("a.one").is_none());
        assert!(mgr.get("b.two").is_some());
    }

    #[test]
    fn clear_for_service_is_idempotent() {
        let mgr = manager();
        mgr.add(make_tool("a", "one"));
        mgr.clear_for_service("a");
        mgr.clear_for_service("a");
        assert_eq!(mgr.list().len(), 0);
    }

    #[test]
    fn unknown_profile_denies_everything() {
        let mgr = manager();
        mgr.add(make_tool("svc", "echo"));
        assert!(mgr.list_for_profile(Some("ghost")).is_empty());
        let (ids, found) = mgr.get_allowed_service_ids("ghost");
        assert!(ids.is_empty());
        assert!(!found);
    }

    #[test]
    fn no_profile_in_context_returns_full_catalog() {
        let mgr = manager();
        mgr.add(make_tool("svc", "echo"));
        assert_eq!(mgr.list_for_profile(None).len(), 1);
    }

    #[test]
    fn known_profile_filters_by_allowed_service() {
        let mgr = manager();
        mgr.add(make_tool("svc-a", "echo"));
        mgr.add(make_tool("svc-b", "echo"));

        let mut per_service = HashMap::new();
        per_service.insert(
            "svc-a".to_string(),
            ProfileTools {
                enabled: true,
                tools: HashMap::new(),
            },
        );
        let mut profiles = HashMap::new();
        profiles.insert(
            "p1".to_string(),
            Profile {
                name: "p1".into(),
                per_service,
            },
        );
        mgr.set_profiles(profiles);

        let visible = mgr.list_for_profile(Some("p1"));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].describe().service_id, "svc-a");
        assert!(mgr.is_service_allowed("svc-a", Some("p1")));
        assert!(!mgr.is_service_allowed("svc-b", Some("p1")));
    }

    #[tokio::test]
    async fn execute_tool_resolves_and_dispatches() {
        let mgr = manager();
        mgr.add(make_tool("svc", "echo"));
        let req = ExecutionRequest::new("svc.echo", b"{}".to_vec());
        let out = mgr
            .execute_tool(ExecutionContext::default(), req)
            .await
            .unwrap();
        assert!(matches!(out, ToolOutcome::Other(_)));
    }

    #[tokio::test]
    async fn execute_tool_on_unhealthy_service_is_rejected() {
        let mgr = manager();
        mgr.add(make_tool("svc", "echo"));
        mgr.add_service_info(ServiceInfo {
            service_id: "svc".into(),
            name: "svc".into(),
            config: json!({}),
            health_status: mcprouter_core::HealthStatus::Healthy,
        });
        mgr.set_service_health("svc", mcprouter_core::HealthStatus::Unhealthy);

        let req = ExecutionRequest::new("svc.echo", b"{}".to_vec());
        let err = mgr
            .execute_tool(ExecutionContext::default(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unhealthy(_)));
    }

    #[test]
    fn service_with_no_recorded_info_is_healthy_by_default() {
        let mgr = manager();
        assert!(mgr.is_service_healthy("svc"));
    }

    #[tokio::test]
    async fn execute_tool_missing_id_is_not_found() {
        let mgr = manager();
        let req = ExecutionRequest::new("svc.missing", b"{}".to_vec());
        let err = mgr
            .execute_tool(ExecutionContext::default(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
