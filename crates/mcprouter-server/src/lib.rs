// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Router, MCP middleware chain, `CallTool` execution path, structured
//! logging/redaction, and the session wrapper (§4.5,
//! §4.9-§4.10).

mod builtin;
mod call_tool;
mod chain;
mod coercion;
mod dlp;
mod handler;
mod list_filter;
pub mod metrics;
mod redact;
mod router;
mod session;

pub use builtin::{ListRootsTool, BUILTIN_SERVICE_ID, LIST_ROOTS_TOOL_NAME};
pub use call_tool::CallToolHandler;
pub use chain::{McpChain, McpMiddleware, McpNext, McpRequest, RouterMiddleware};
pub use coercion::{coerce, Coerced};
pub use dlp::{DefaultDlpPredicate, DlpMiddleware, DlpPredicate};
pub use handler::McpRouterServer;
pub use list_filter::{PromptsListFilter, ResourcesListFilter, ToolsListFilter};
pub use redact::{LazyLogResult, LazyRedact};
pub use router::{MethodHandler, Router, RouterBuilder};
pub use session::{CachingSampler, Session, SessionRegistry};
