// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The session wrapper: lets a tool reach back into the
//! connecting client for sampling (`CreateMessage`) and filesystem
//! roots (`ListRoots`), plus a caching decorator over sampling.

use std::sync::Arc;

use mcprouter_core::{CacheConfig, CoreError};
use mcprouter_managers::{ListChangeKind, McpServerProvider};
use rmcp::model::{CreateMessageRequestParam, CreateMessageResult, ListRootsResult};
use rmcp::service::{Peer, RoleServer};
use sha2::{Digest, Sha256};

/// Thin wrapper around the live client `Peer`, threaded through
/// `ExecutionContext` by the server so upstream tools never need to
/// know about `rmcp` directly: it stores and clones the peer for
/// background notifications the same way `McpRouterServer` does.
#[derive(Clone)]
pub struct Session {
    peer: Peer<RoleServer>,
}

impl Session {
    pub fn new(peer: Peer<RoleServer>) -> Self {
        Self { peer }
    }

    pub async fn create_message(
        &self,
        params: CreateMessageRequestParam,
    ) -> Result<CreateMessageResult, CoreError> {
        self.peer
            .create_message(params)
            .await
            .map_err(|e| CoreError::Upstream(format!("sampling request failed: {e}")))
    }

    pub async fn list_roots(&self) -> Result<ListRootsResult, CoreError> {
        self.peer
            .list_roots()
            .await
            .map_err(|e| CoreError::Upstream(format!("list_roots request failed: {e}")))
    }

    /// Fires the matching `notifications/<kind>/list_changed` MCP
    /// message on a background task rather than blocking the caller
    /// that triggered the catalog change.
    fn notify_list_changed(&self, kind: ListChangeKind) {
        let peer = self.peer.clone();
        tokio::spawn(async move {
            let result = match kind {
                ListChangeKind::Tools => peer.notify_tool_list_changed().await,
                ListChangeKind::Prompts => peer.notify_prompt_list_changed().await,
                ListChangeKind::Resources => peer.notify_resource_list_changed().await,
            };
            if let Err(err) = result {
                tracing::warn!(?kind, %err, "failed to notify list changed");
            }
        });
    }
}

fn canonical_hash(params: &CreateMessageRequestParam) -> Option<String> {
    let value = serde_json::to_value(params).ok()?;
    let canonical = serde_json::to_vec(&value).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Some(format!("{:x}", hasher.finalize()))
}

/// `include_context` values treated as "no client-side context leaked
/// into the response", making the response safe to memoize.
fn is_cacheable_context(include_context: Option<&str>) -> bool {
    matches!(include_context, None | Some("") | Some("none"))
}

/// Memoizes `CreateMessage` by hash of the canonical JSON of `params`,
/// honoring `cache_config.ttl`. Requests whose
/// `include_context` is anything but empty/`"none"` always skip the
/// cache, since the response then depends on context the router can't
/// see.
pub struct CachingSampler {
    session: Session,
    cache: moka::future::Cache<String, CreateMessageResult>,
}

impl CachingSampler {
    pub fn new(session: Session, cache_config: CacheConfig) -> Self {
        Self {
            session,
            cache: moka::future::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(cache_config.ttl)
                .build(),
        }
    }

    pub fn with_default_ttl(session: Session) -> Self {
        Self::new(session, CacheConfig::default_sampler())
    }

    pub async fn create_message(
        &self,
        params: CreateMessageRequestParam,
    ) -> Result<CreateMessageResult, CoreError> {
        let include_context = params.include_context.as_deref();
        if !is_cacheable_context(include_context) {
            return self.session.create_message(params).await;
        }

        let Some(key) = canonical_hash(&params) else {
            return self.session.create_message(params).await;
        };

        if let Some(cached) = self.cache.get(&key).await {
            tracing::trace!("sampling cache hit");
            return Ok(cached);
        }

        let result = self.session.create_message(params).await?;
        self.cache.insert(key, result.clone()).await;
        Ok(result)
    }
}

/// Every tool reaches the active session (if any) through this holder
/// rather than through `ExecutionContext` directly, so
/// `mcprouter-core` stays free of any `rmcp` dependency.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<std::sync::RwLock<Option<Session>>>,
}

impl SessionRegistry {
    pub fn set(&self, session: Session) {
        *self.inner.write().unwrap() = Some(session);
    }

    pub fn get(&self) -> Result<Session, CoreError> {
        self.inner
            .read()
            .unwrap()
            .clone()
            .ok_or(CoreError::NoSession)
    }
}

/// The manager -> server backreference, implemented over
/// whichever session is currently active: no session connected yet
/// means no one to notify, so it's a silent no-op rather than an
/// error (mirroring `NoOpProvider`'s behavior before a server exists).
impl McpServerProvider for SessionRegistry {
    fn notify_list_changed(&self, kind: ListChangeKind) {
        if let Ok(session) = self.get() {
            session.notify_list_changed(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cacheable_context_accepts_none_and_literal_none() {
        assert!(is_cacheable_context(None));
        assert!(is_cacheable_context(Some("")));
        assert!(is_cacheable_context(Some("none")));
        assert!(!is_cacheable_context(Some("thisServer")));
        assert!(!is_cacheable_context(Some("allServers")));
    }

    #[test]
    fn session_registry_starts_empty() {
        let registry = SessionRegistry::default();
        assert!(matches!(registry.get(), Err(CoreError::NoSession)));
    }
}
