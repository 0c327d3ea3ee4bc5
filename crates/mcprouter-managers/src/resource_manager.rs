// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The resource catalog, including the
//! `OnListChanged` callback the MCP server core uses to emit
//! `notifications/resources/list_changed`.

use std::sync::{Arc, RwLock, Weak};

use dashmap::DashMap;
use mcprouter_core::{CoreError, ExecutionContext, Resource, ResourceContents, ResourceReader};

use crate::provider::{ListChangeKind, McpServerProvider};

type ListChangedCallback = Arc<dyn Fn() + Send + Sync>;

pub struct ResourceManager {
    resources: DashMap<String, Resource>,
    readers: DashMap<String, Arc<dyn ResourceReader>>,
    server: RwLock<Option<Weak<dyn McpServerProvider>>>,
    callbacks: RwLock<Vec<ListChangedCallback>>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    pub fn new() -> Self {
        Self {
            resources: DashMap::new(),
            readers: DashMap::new(),
            server: RwLock::new(None),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Register resource metadata only, with no `read` capability
    /// attached. `read` on such a resource fails with `NotFound`.
    pub fn add(&self, resource: Resource) {
        self.resources.insert(resource.uri.clone(), resource);
        self.fire_list_changed();
    }

    /// Register a resource together with the capability that reads it
    /// (: Resource is `{uri, service_id, mime_type, description}`
    /// plus a `read() → ResourceContents` operation).
    pub fn add_with_reader(&self, resource: Resource, reader: Arc<dyn ResourceReader>) {
        let uri = resource.uri.clone();
        self.readers.insert(uri.clone(), reader);
        self.resources.insert(uri, resource);
        self.fire_list_changed();
    }

    pub fn get(&self, uri: &str) -> Option<Resource> {
        self.resources.get(uri).map(|e| e.value().clone())
    }

    pub fn list(&self) -> Vec<Resource> {
        self.resources.iter().map(|e| e.value().clone()).collect()
    }

    pub fn clear_for_service(&self, service_id: &str) {
        let removed: Vec<String> = self
            .resources
            .iter()
            .filter(|e| e.value().service_id == service_id)
            .map(|e| e.key().clone())
            .collect();
        for uri in &removed {
            self.readers.remove(uri);
        }
        self.resources.retain(|_, r| r.service_id != service_id);
        self.fire_list_changed();
    }

    /// `resources/read`'s manager-side half: resolve the resource,
    /// then its reader, and read it.
    pub async fn read(&self, ctx: ExecutionContext, uri: &str) -> Result<ResourceContents, CoreError> {
        if self.get(uri).is_none() {
            return Err(CoreError::NotFound(format!("no resource registered for uri {uri}")));
        }
        let reader = self.readers.get(uri).map(|e| e.value().clone());
        match reader {
            Some(reader) => reader.read(ctx).await,
            None => Err(CoreError::NotFound(format!(
                "resource {uri} has no reader configured"
            ))),
        }
    }

    pub fn set_mcp_server(&self, server: Weak<dyn McpServerProvider>) {
        *self.server.write().unwrap() = Some(server);
    }

    /// Register a callback invoked whenever a resource is added or
    /// removed. Used by the MCP server core to emit
    /// `notifications/resources/list_changed`.
    pub fn on_list_changed(&self, callback: ListChangedCallback) {
        self.callbacks.write().unwrap().push(callback);
    }

    fn fire_list_changed(&self) {
        for callback in self.callbacks.read().unwrap().iter() {
            callback();
        }
        if let Some(provider) = self.server.read().unwrap().as_ref().and_then(Weak::upgrade) {
            provider.notify_list_changed(ListChangeKind::Resources);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resource(service_id: &str, uri: &str) -> Resource {
        Resource {
            uri: uri.to_string(),
            service_id: service_id.to_string(),
            mime_type: "text/plain".to_string(),
            description: "test".to_string(),
        }
    }

    #[test]
    fn add_get_clear_round_trip() {
        let mgr = ResourceManager::new();
        mgr.add(resource("svc", "svc://a"));
        assert!(mgr.get("svc://a").is_some());
        mgr.clear_for_service("svc");
        assert!(mgr.get("svc://a").is_none());
    }

    #[test]
    fn on_list_changed_fires_for_add_and_clear() {
        let mgr = ResourceManager::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        mgr.on_list_changed(Arc::new(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        }));

        mgr.add(resource("svc", "svc://a"));
        mgr.clear_for_service("svc");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn read_without_reader_is_not_found() {
        let mgr = ResourceManager::new();
        mgr.add(resource("svc", "svc://a"));
        let err = mgr
            .read(ExecutionContext::default(), "svc://a")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_missing_resource_is_not_found() {
        let mgr = ResourceManager::new();
        let err = mgr
            .read(ExecutionContext::default(), "svc://missing")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_dispatches_to_registered_reader() {
        use mcprouter_core::testing::StaticResourceReader;

        let mgr = ResourceManager::new();
        let contents = ResourceContents {
            uri: "svc://a".to_string(),
            mime_type: "text/plain".to_string(),
            text: Some("hello".to_string()),
            blob: None,
        };
        mgr.add_with_reader(
            resource("svc", "svc://a"),
            Arc::new(StaticResourceReader::returning(contents)),
        );

        let out = mgr.read(ExecutionContext::default(), "svc://a").await.unwrap();
        assert_eq!(out.text.as_deref(), Some("hello"));

        mgr.clear_for_service("svc");
        let err = mgr
            .read(ExecutionContext::default(), "svc://a")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
