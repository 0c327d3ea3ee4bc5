// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `bootstrap::build` is the single place that wires the bus, the
//! three managers, the registration pipeline, and the MCP middleware
//! chain together, the way `main.rs`'s `Commands::Serve` arm wires a
//! running server before it starts serving.

use std::sync::Arc;

use anyhow::{Context, Result};
use mcprouter_bus::{InMemoryBus, MessageBus};
use mcprouter_managers::{
    CachingMiddleware, McpServerProvider, MiddlewarePipeline, PromptManager, ResourceManager,
    ToolManager,
};
use mcprouter_registration::testing::StaticDiscoverer;
use mcprouter_registration::{
    CacheServiceImpl, InMemoryServiceCatalog, RegistrationServer, RegistrationWorker,
};
use mcprouter_server::{
    CallToolHandler, DefaultDlpPredicate, DlpMiddleware, GetPromptHandler, ListRootsTool, McpChain,
    McpRouterServer, PromptsListFilter, ReadResourceHandler, ResourcesListFilter, Router,
    RouterMiddleware, SessionRegistry, ToolsListFilter,
};
use mcprouter_skills::{SkillResourceReader, SkillsRoot};

use crate::config::Config;

/// Everything `main` needs to hand off to a transport plus the gRPC
/// admin server, and the background tasks it should keep alive.
pub struct Runtime {
    pub mcp_server: McpRouterServer,
    pub registration_server: RegistrationServer,
    pub cache_service: CacheServiceImpl,
    pub worker_handle: tokio::task::JoinHandle<()>,
    /// Kept alive for the process lifetime: the managers only hold a
    /// `Weak` back-reference to this, so it must outlive
    /// them or every `notify_list_changed` call silently no-ops.
    _provider: Arc<dyn McpServerProvider>,
}

/// Build every subsystem in dependency order: bus, managers (with
/// their provider backreference), skills, registration pipeline, then
/// the MCP chain.
pub async fn build(config: &Config) -> Result<Runtime> {
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());

    let sessions = SessionRegistry::default();
    // `Arc<SessionRegistry>` so the manager's `Weak<dyn McpServerProvider>`
    // backreference can upgrade it without a cycle back to
    // the managers themselves.
    let provider: Arc<dyn McpServerProvider> = Arc::new(sessions.clone());
    let provider_weak = Arc::downgrade(&provider);

    let caching_middleware = Arc::new(CachingMiddleware::default());
    let tool_manager = Arc::new(ToolManager::new(MiddlewarePipeline::new(vec![
        caching_middleware.clone(),
    ])));
    tool_manager.set_mcp_server(provider_weak.clone());

    let prompt_manager = Arc::new(PromptManager::new());
    prompt_manager.set_mcp_server(provider_weak.clone());

    let resource_manager = Arc::new(ResourceManager::new());
    resource_manager.set_mcp_server(provider_weak.clone());

    if !config.profiles.is_empty() {
        tool_manager.set_profiles(config.profiles.clone());
    }

    // Built-in tools (: `mcp:list_roots` under the synthetic
    // `builtin` service) are always present, independent of any
    // upstream registration.
    tool_manager.add(Arc::new(ListRootsTool::new(sessions.clone())));

    if let Some(root) = &config.skills_root {
        wire_skills(&resource_manager, root).context("failed to wire skill resources")?;
    }

    // Concrete upstream connectors (HTTP/gRPC/OpenAPI/WebSocket/command)
    // are out of scope for this workspace; `StaticDiscoverer`
    // is the seam's placeholder until a real connector is plugged in.
    let discoverer: Arc<dyn mcprouter_registration::ServiceDiscoverer> =
        Arc::new(StaticDiscoverer::with_service_key("unassigned"));
    let catalog: Arc<dyn mcprouter_registration::ServiceCatalog> =
        Arc::new(InMemoryServiceCatalog::new());

    let worker = Arc::new(
        RegistrationWorker::new(bus.clone(), discoverer.clone(), catalog.clone())
            .with_tool_manager(tool_manager.clone()),
    );
    let worker_handle = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });

    let registration_server = RegistrationServer::new(bus.clone(), discoverer, catalog, None);
    let cache_service = CacheServiceImpl::new(Some(caching_middleware));

    let chain = Arc::new(McpChain::new(vec![
        Arc::new(DlpMiddleware::new(Arc::new(DefaultDlpPredicate))),
        Arc::new(RouterMiddleware::new(Arc::new(
            Router::builder()
                .register("tools/call", Arc::new(CallToolHandler::new(tool_manager.clone())))
                .register(
                    "prompts/get",
                    Arc::new(GetPromptHandler::new(
                        prompt_manager.clone(),
                        tool_manager.clone(),
                    )),
                )
                .register(
                    "resources/read",
                    Arc::new(ReadResourceHandler::new(
                        resource_manager.clone(),
                        tool_manager.clone(),
                    )),
                )
                .build(),
        ))),
        Arc::new(ToolsListFilter::new(tool_manager.clone())),
        Arc::new(PromptsListFilter::new(
            prompt_manager.clone(),
            tool_manager.clone(),
        )),
        Arc::new(ResourcesListFilter::new(
            resource_manager.clone(),
            tool_manager.clone(),
        )),
    ]));

    let mcp_server = McpRouterServer::new(
        chain,
        sessions,
        "Multi-upstream MCP router: aggregates registered backend services behind one MCP endpoint.",
    );

    Ok(Runtime {
        mcp_server,
        registration_server,
        cache_service,
        worker_handle,
        _provider: provider,
    })
}

fn wire_skills(resource_manager: &Arc<ResourceManager>, root: &std::path::Path) -> Result<()> {
    let skills_root = Arc::new(SkillsRoot::new(root));
    for resource in skills_root
        .list_resources()
        .context("failed to enumerate skill resources")?
    {
        let reader = Arc::new(SkillResourceReader::new(skills_root.clone(), resource.uri.clone()));
        resource_manager.add_with_reader(resource, reader);
    }
    Ok(())
}
