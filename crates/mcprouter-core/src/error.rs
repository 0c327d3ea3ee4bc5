// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Error kinds shared across the router.

use thiserror::Error;

/// The error kinds the router core can fail with.
///
/// Transport-facing crates (gRPC, MCP) convert this into their own
/// wire error type at the boundary rather than leaking it directly.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed request or missing required field.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Tool/prompt/resource/service not registered.
    #[error("not found: {0}")]
    NotFound(String),

    /// Profile forbids the target.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Target service is marked unhealthy.
    #[error("service unhealthy: {0}")]
    Unhealthy(String),

    /// Bus waiter or safety timer expired.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Error propagated from an upstream adapter. Callers that surface
    /// this to an MCP client must package it into a `CallToolResult`
    /// with `is_error = true`, never as an RPC-level error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Skill-resource path escapes its base directory.
    #[error("invalid asset path: {0}")]
    InvalidPath(String),

    /// File exceeded the configured size cap.
    #[error("resource too large: {0}")]
    ResourceTooLarge(String),

    /// Sampling/roots requested but no session is present on the context.
    #[error("no session available")]
    NoSession,

    /// Anything else (serialization failures, internal invariants).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// True if this error kind should never be logged with the raw
    /// request arguments attached. All kinds qualify; this exists so call
    /// sites can assert the policy rather than re-derive it.
    pub fn never_logs_raw_arguments(&self) -> bool {
        true
    }
}
