// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! CLI surface: `mcprouter serve` runs the router; `mcprouter admin
//! ...` calls the gRPC admin surface as a thin client for operators.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "mcprouter", about = "Multi-upstream MCP router")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print build/version information and exit.
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the router, serving MCP over the configured transport and
    /// the gRPC admin surface side by side.
    Serve(Serve),
    /// Operator commands against a running router's admin surface.
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// List registered upstream services.
    ListServices {
        #[arg(long, default_value = "http://127.0.0.1:9002")]
        admin_endpoint: String,
    },
    /// Clear the tool-result cache.
    ClearCache {
        #[arg(long, default_value = "http://127.0.0.1:9002")]
        admin_endpoint: String,
    },
}

/// MCP transport selection.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Sse,
    StreamableHttp,
}

#[derive(Parser, Debug, Serialize, Default)]
pub struct Serve {
    /// MCP transport to serve over.
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    #[serde(rename = "transport")]
    pub transport: Transport,

    /// Bind address for HTTP-based transports (sse, streamable-http).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Bind address for the gRPC admin surface.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_bind_address: Option<String>,

    /// Root directory of skill subdirectories.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_root: Option<PathBuf>,

    /// Number of registration workers to spawn against the bus.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_workers: Option<usize>,
}
