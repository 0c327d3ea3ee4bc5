// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The manager → server backreference.
//!
//! The tool/resource managers need to notify the MCP server core when
//! their catalogs change, but the server owns the managers, so a
//! strong reference back would be a cycle. Instead the server hands
//! each manager a [`McpServerProvider`] at setup; managers hold it
//! behind a `Weak`-friendly `Arc<dyn ..>` and simply no-op once the
//! server has gone away.

/// What changed, for [`McpServerProvider::notify_list_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChangeKind {
    Tools,
    Prompts,
    Resources,
}

/// Capability the MCP server core exposes back to the managers.
///
/// Kept deliberately narrow: managers only ever need to ask the server
/// to emit a `notifications/<kind>/list_changed` MCP message.
pub trait McpServerProvider: Send + Sync {
    fn notify_list_changed(&self, kind: ListChangeKind);
}

/// A provider that does nothing; the default for managers built before
/// a real server exists (e.g. in [`crate::temporary::TemporaryToolManager`]
/// flows, or in tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpProvider;

impl McpServerProvider for NoOpProvider {
    fn notify_list_changed(&self, _kind: ListChangeKind) {}
}
