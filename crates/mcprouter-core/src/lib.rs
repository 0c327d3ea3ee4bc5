// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Domain model shared by every crate in the router: tools, prompts,
//! resources, services, profiles, and the error kinds they can fail with.
//!
//! This crate has no transport, storage, or middleware concerns of its
//! own — it is the vocabulary the rest of the workspace agrees on.

mod error;
mod ids;
mod model;
mod prompt;
mod resource;
mod tool;

pub mod testing;

pub use error::CoreError;
pub use ids::{composite_tool_id, parse_composite_tool_id, sanitize_name};
pub use model::{
    CacheConfig, ExecutionRequest, HealthStatus, Profile, ProfileTools, Prompt, Resource,
    ResourceContents, ServiceInfo, Tool,
};
pub use prompt::{PromptEvaluator, PromptMessage, PromptRole};
pub use resource::ResourceReader;
pub use tool::{ExecutionContext, ToolDescriptor, ToolOutcome, UpstreamTool};
