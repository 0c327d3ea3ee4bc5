// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Authoritative catalogs for tools, prompts, and resources, with
//! profile-scoped visibility and the execution middleware pipeline
//!.

mod middleware;
mod noop;
mod prompt_manager;
mod provider;
mod resource_manager;
mod temporary;
mod tool_manager;

pub use middleware::{CachingMiddleware, ExecutionMiddleware, MiddlewarePipeline, Next};
pub use noop::{NoOpPromptManager, NoOpResourceManager};
pub use prompt_manager::PromptManager;
pub use provider::{ListChangeKind, McpServerProvider, NoOpProvider};
pub use resource_manager::ResourceManager;
pub use temporary::TemporaryToolManager;
pub use tool_manager::ToolManager;

use mcprouter_core::{composite_tool_id, ToolDescriptor};

pub(crate) fn composite_id_of(descriptor: &ToolDescriptor) -> String {
    composite_tool_id(&descriptor.service_id, &descriptor.name)
}
