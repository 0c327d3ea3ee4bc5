// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The gRPC admin surface (`RegistrationService`, `CacheService`) and
//! the asynchronous registration pipeline that backs it.
//!
//! Concrete upstream connectors are out of scope for this workspace
//!; [`ServiceDiscoverer`] is the seam a real implementation
//! plugs into, the same way `mcprouter_core::UpstreamTool` is the seam
//! for tool execution.

pub mod proto {
    tonic::include_proto!("mcprouter.registration");
}

mod catalog;
mod discoverer;
mod error;
mod oauth;
mod service;
mod topics;
mod validate;
mod worker;

pub mod testing;

pub use catalog::{InMemoryServiceCatalog, ServiceCatalog};
pub use discoverer::{DiscoveryResult, ServiceConfigInput, ServiceDiscoverer};
pub use error::core_error_to_status;
pub use oauth::{OAuth2Grant, OAuth2Initiator};
pub use service::{CacheClearable, CacheServiceImpl, RegistrationServer};
pub use topics::{
    SERVICE_GET_REQUESTS, SERVICE_GET_RESULTS, SERVICE_LIST_REQUESTS, SERVICE_LIST_RESULTS,
    SERVICE_REGISTRATION_REQUESTS, SERVICE_REGISTRATION_RESULTS,
};
pub use validate::validate_service;
pub use worker::RegistrationWorker;

use std::time::Duration;

/// Safety timeout for `RegisterService` round trips.
pub const REGISTER_TIMEOUT: Duration = Duration::from_secs(300);

/// Safety timeout for `GetService`/`ListServices` round trips (spec
/// §4.7/§5: "30 s for get/list").
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
