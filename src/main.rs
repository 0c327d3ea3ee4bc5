// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The main `mcprouter(1)` command: `serve` runs the router (MCP
//! transport plus the gRPC admin surface side by side), `admin ...`
//! is a thin client against a running router's admin surface.

use anyhow::{Context, Result};
use clap::Parser;
use mcprouter_registration::proto::cache_service_client::CacheServiceClient;
use mcprouter_registration::proto::registration_service_client::RegistrationServiceClient;
use mcprouter_registration::proto::{ClearCacheRequest, ListServicesRequest};
use mcprouter_registration::proto::{
    cache_service_server::CacheServiceServer, registration_service_server::RegistrationServiceServer,
};
use rmcp::service::serve_server;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::transport::{stdio as stdio_transport, SseServer};

mod bootstrap;
mod commands;
mod config;
mod telemetry;

use commands::{AdminCommands, Cli, Commands, Transport};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("mcprouter {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match cli.command {
        Some(Commands::Serve(serve)) => run_serve(serve).await,
        Some(Commands::Admin(admin)) => run_admin(admin).await,
        None => {
            println!("mcprouter {}", env!("CARGO_PKG_VERSION"));
            println!("Run `mcprouter serve` to start the router, or `mcprouter --help`.");
            Ok(())
        }
    }
}

async fn run_serve(serve: commands::Serve) -> Result<()> {
    let config = Config::from_serve(&serve)?;
    let _telemetry_guard = telemetry::init(&config).context("failed to initialize telemetry")?;

    let runtime = bootstrap::build(&config)
        .await
        .context("failed to build router runtime")?;

    let admin_addr = config
        .admin_bind_address
        .parse()
        .context("invalid admin_bind_address")?;
    let registration_server = runtime.registration_server;
    let cache_service = runtime.cache_service;
    let admin_handle = tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(RegistrationServiceServer::new(registration_server))
            .add_service(CacheServiceServer::new(cache_service))
            .serve(admin_addr)
            .await
    });

    let server = runtime.mcp_server;
    let bind_address = config.bind_address.clone();

    match config.transport {
        Transport::Stdio => {
            tracing::info!("starting MCP router with stdio transport");
            let transport = stdio_transport();
            let running_service = serve_server(server, transport).await?;
            tokio::signal::ctrl_c().await?;
            let _ = running_service.cancel().await;
        }
        Transport::StreamableHttp => {
            tracing::info!(%bind_address, "starting MCP router with streamable HTTP transport");
            let service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );
            let router = axum::Router::new().nest_service("/mcp", service);
            let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;
            tracing::info!(%bind_address, "MCP router is ready and listening on /mcp");
            axum::serve(tcp_listener, router)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.unwrap();
                })
                .await?;
        }
        Transport::Sse => {
            tracing::info!(%bind_address, "starting MCP router with SSE HTTP transport");
            let ct = SseServer::serve(bind_address.parse()?)
                .await?
                .with_service(move || server.clone());
            tracing::info!(%bind_address, "MCP router is ready and listening on /sse");
            tokio::signal::ctrl_c().await?;
            ct.cancel();
        }
    }

    tracing::info!("MCP router shutting down");
    runtime.worker_handle.abort();
    admin_handle.abort();
    Ok(())
}

async fn run_admin(command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::ListServices { admin_endpoint } => {
            let mut client = RegistrationServiceClient::connect(admin_endpoint)
                .await
                .context("failed to connect to the admin gRPC endpoint")?;
            let response = client
                .list_services(ListServicesRequest {})
                .await
                .context("ListServices RPC failed")?
                .into_inner();
            for service in response.services {
                let config = service.config.unwrap_or_default();
                println!("{}\t{}\t{}", config.service_id, config.name, service.health_status);
            }
        }
        AdminCommands::ClearCache { admin_endpoint } => {
            let mut client = CacheServiceClient::connect(admin_endpoint)
                .await
                .context("failed to connect to the admin gRPC endpoint")?;
            client
                .clear_cache(ClearCacheRequest {})
                .await
                .context("ClearCache RPC failed")?;
            println!("cache cleared");
        }
    }
    Ok(())
}
