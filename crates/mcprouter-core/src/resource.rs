// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The `ResourceReader` capability: the `read() → ResourceContents`
//! half of the Resource type, plus an optional `subscribe()`.
//! One instance per registered resource, closing over its own URI —
//! the skill resource reader (`mcprouter-skills`) is the one concrete
//! implementation this workspace ships; upstream-service-backed
//! resources are out of scope.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::ResourceContents;
use crate::tool::ExecutionContext;

#[async_trait]
pub trait ResourceReader: Send + Sync {
    async fn read(&self, ctx: ExecutionContext) -> Result<ResourceContents, CoreError>;

    /// Whether this resource supports `resources/subscribe`. None of
    /// the resource kinds this workspace ships do, so the default is `false`.
    fn supports_subscribe(&self) -> bool {
        false
    }
}
