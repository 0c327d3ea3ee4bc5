// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `InitiateOAuth2Flow` delegates to the OAuth2 credential manager,
//! whose internals are out of scope for this workspace — this
//! trait is the boundary it's delegated across.

use async_trait::async_trait;
use mcprouter_core::CoreError;

/// A started OAuth2 authorization-code flow.
#[derive(Debug, Clone)]
pub struct OAuth2Grant {
    pub authorization_url: String,
    pub state: String,
}

/// Starts an OAuth2 flow for a service or stored credential.
#[async_trait]
pub trait OAuth2Initiator: Send + Sync {
    /// `service_id`/`credential_id` are mutually exclusive identifiers
    /// of what is being authorized; `redirect_url` is where the
    /// provider should send the browser back. An unauthenticated
    /// caller context fails with `CoreError::AccessDenied`, which the
    /// gRPC boundary maps to `Unauthenticated`.
    async fn initiate(
        &self,
        service_id: Option<&str>,
        credential_id: Option<&str>,
        redirect_url: &str,
    ) -> Result<OAuth2Grant, CoreError>;
}
