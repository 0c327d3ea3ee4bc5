// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The gRPC admin surface itself: `RegistrationService` and
//! `CacheService`.

use std::sync::Arc;
use std::time::Duration;

use mcprouter_bus::{Envelope, MessageBus};
use mcprouter_core::CoreError;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::instrument;
use uuid::Uuid;

use crate::catalog::ServiceCatalog;
use crate::discoverer::{DiscoveryResult, ServiceConfigInput, ServiceDiscoverer};
use crate::error::core_error_to_status;
use crate::oauth::OAuth2Initiator;
use crate::proto;
use crate::topics;
use crate::validate::validate_service;
use crate::{QUERY_TIMEOUT, REGISTER_TIMEOUT};

/// Implements `RegistrationService`. `RegisterService`/`GetService`/
/// `ListServices` round-trip over the bus to whichever
/// `RegistrationWorker` picks up the request; `ValidateService` runs
/// discovery inline against a scratch manager and never touches the
/// bus or the real catalog.
pub struct RegistrationServer {
    bus: Arc<dyn MessageBus>,
    discoverer: Arc<dyn ServiceDiscoverer>,
    catalog: Arc<dyn ServiceCatalog>,
    oauth: Option<Arc<dyn OAuth2Initiator>>,
    register_timeout: Duration,
    query_timeout: Duration,
}

impl RegistrationServer {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        discoverer: Arc<dyn ServiceDiscoverer>,
        catalog: Arc<dyn ServiceCatalog>,
        oauth: Option<Arc<dyn OAuth2Initiator>>,
    ) -> Self {
        Self {
            bus,
            discoverer,
            catalog,
            oauth,
            register_timeout: REGISTER_TIMEOUT,
            query_timeout: QUERY_TIMEOUT,
        }
    }

    /// Shrink the registration safety timeout so tests exercising the
    /// no-worker-ever-answers path don't wait 300 seconds for real.
    #[cfg(test)]
    fn with_register_timeout_for_test(mut self, timeout: Duration) -> Self {
        self.register_timeout = timeout;
        self
    }

    /// Steps 2–6 of  registration contract, generalized over
    /// the request/result topic pair and timeout so `GetService` and
    /// `ListServices` can reuse it.
    async fn bus_round_trip(
        &self,
        request_topic: &str,
        result_topic: &str,
        payload: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, Status> {
        let correlation_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let timer_cancel = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            timer_cancel.cancel();
        });

        // Subscribe before publishing: `broadcast` does not buffer for
        // late subscribers, so a worker replying faster than we reach
        // `subscribe_once` would otherwise drop the reply. Spawning the
        // wait first and yielding once guarantees its subscription is
        // live before the request goes out.
        //
        // `subscribe_once` releases its subscription on every exit path
        // (match, cancel, or the future itself being dropped if the
        // gRPC client disconnects), satisfying "always unsubscribe on
        // return" without extra bookkeeping here.
        let bus = self.bus.clone();
        let wait_topic = result_topic.to_string();
        let wait_correlation = correlation_id.clone();
        let waiter = tokio::spawn(async move { bus.subscribe_once(&wait_topic, &wait_correlation, cancel).await });
        tokio::task::yield_now().await;

        self.bus.publish(Envelope::with_correlation(
            request_topic,
            correlation_id,
            payload,
        ));

        let result = waiter
            .await
            .map_err(|e| Status::internal(format!("result wait task panicked: {e}")))?;
        timer.abort();

        result
            .map(|envelope| envelope.payload)
            .ok_or_else(|| Status::deadline_exceeded(format!("no response on {result_topic} within {timeout:?}")))
    }
}

#[tonic::async_trait]
impl proto::registration_service_server::RegistrationService for RegistrationServer {
    #[instrument(skip(self, request))]
    async fn register_service(
        &self,
        request: Request<proto::RegisterServiceRequest>,
    ) -> Result<Response<proto::RegisterServiceResponse>, Status> {
        let config = ServiceConfigInput::from_proto(request.into_inner().config)
            .map_err(core_error_to_status)?;
        let payload = serde_json::json!({
            "service_id": config.service_id,
            "name": config.name,
            "config": config.config,
        });

        let result = self
            .bus_round_trip(
                topics::SERVICE_REGISTRATION_REQUESTS,
                topics::SERVICE_REGISTRATION_RESULTS,
                payload,
                self.register_timeout,
            )
            .await?;

        if result.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let message = result
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("registration failed")
                .to_string();
            return Err(Status::internal(message));
        }

        let discovery: DiscoveryResult = serde_json::from_value(result.clone()).unwrap_or_default();
        Ok(Response::new(proto::RegisterServiceResponse {
            service_key: result
                .get("service_key")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            discovered_tools: discovery.to_proto_tools(),
            discovered_resources: discovery.to_proto_resources(),
            message: result
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }))
    }

    #[instrument(skip(self, request))]
    async fn validate_service(
        &self,
        request: Request<proto::ValidateServiceRequest>,
    ) -> Result<Response<proto::ValidateServiceResponse>, Status> {
        let config = ServiceConfigInput::from_proto(request.into_inner().config)
            .map_err(core_error_to_status)?;
        let outcome = validate_service(&config, self.discoverer.as_ref())
            .await
            .map_err(core_error_to_status)?;

        Ok(Response::new(proto::ValidateServiceResponse {
            valid: outcome.valid,
            message: outcome.message,
            discovered_tools: outcome.discovery.to_proto_tools(),
            discovered_resources: outcome.discovery.to_proto_resources(),
        }))
    }

    #[instrument(skip(self, request))]
    async fn get_service(
        &self,
        request: Request<proto::GetServiceRequest>,
    ) -> Result<Response<proto::GetServiceResponse>, Status> {
        let name = request.into_inner().name;
        if name.trim().is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        let result = self
            .bus_round_trip(
                topics::SERVICE_GET_REQUESTS,
                topics::SERVICE_GET_RESULTS,
                serde_json::json!({ "name": name.clone() }),
                self.query_timeout,
            )
            .await?;

        let service: Option<mcprouter_core::ServiceInfo> =
            serde_json::from_value(result.get("service").cloned().unwrap_or_default()).ok();
        let service = service.ok_or_else(|| Status::not_found(format!("service '{name}'")))?;

        Ok(Response::new(proto::GetServiceResponse {
            config: Some(proto::ServiceConfig {
                service_id: service.service_id,
                name: service.name,
                config_json: service.config.to_string(),
            }),
            health_status: format!("{:?}", service.health_status).to_lowercase(),
        }))
    }

    #[instrument(skip(self, _request))]
    async fn list_services(
        &self,
        _request: Request<proto::ListServicesRequest>,
    ) -> Result<Response<proto::ListServicesResponse>, Status> {
        let result = self
            .bus_round_trip(
                topics::SERVICE_LIST_REQUESTS,
                topics::SERVICE_LIST_RESULTS,
                serde_json::json!({}),
                self.query_timeout,
            )
            .await?;

        let services: Vec<mcprouter_core::ServiceInfo> =
            serde_json::from_value(result.get("services").cloned().unwrap_or_default()).unwrap_or_default();

        Ok(Response::new(proto::ListServicesResponse {
            services: services
                .into_iter()
                .map(|s| proto::GetServiceResponse {
                    health_status: format!("{:?}", s.health_status).to_lowercase(),
                    config: Some(proto::ServiceConfig {
                        service_id: s.service_id,
                        name: s.name,
                        config_json: s.config.to_string(),
                    }),
                })
                .collect(),
        }))
    }

    #[instrument(skip(self, request))]
    async fn initiate_oauth2_flow(
        &self,
        request: Request<proto::InitiateOauth2FlowRequest>,
    ) -> Result<Response<proto::InitiateOauth2FlowResponse>, Status> {
        let req = request.into_inner();
        let Some(oauth) = &self.oauth else {
            return Err(Status::unauthenticated("no OAuth2 authority configured"));
        };
        let service_id = (!req.service_id.is_empty()).then_some(req.service_id.as_str());
        let credential_id = (!req.credential_id.is_empty()).then_some(req.credential_id.as_str());

        let grant = oauth
            .initiate(service_id, credential_id, &req.redirect_url)
            .await
            .map_err(|e| match e {
                CoreError::AccessDenied(msg) => Status::unauthenticated(msg),
                other => core_error_to_status(other),
            })?;

        Ok(Response::new(proto::InitiateOauth2FlowResponse {
            authorization_url: grant.authorization_url,
            state: grant.state,
        }))
    }

    async fn unregister_service(
        &self,
        _request: Request<proto::UnregisterServiceRequest>,
    ) -> Result<Response<proto::UnregisterServiceResponse>, Status> {
        Err(Status::unimplemented("UnregisterService is not implemented"))
    }

    async fn register_tools(
        &self,
        _request: Request<proto::RegisterToolsRequest>,
    ) -> Result<Response<proto::RegisterToolsResponse>, Status> {
        Err(Status::unimplemented("RegisterTools is not implemented"))
    }

    async fn get_service_status(
        &self,
        _request: Request<proto::GetServiceStatusRequest>,
    ) -> Result<Response<proto::GetServiceStatusResponse>, Status> {
        Err(Status::unimplemented("GetServiceStatus is not implemented"))
    }
}

/// Implements `CacheService`. `ClearCache` fails `FailedPrecondition`
/// when no cache was configured.
pub struct CacheServiceImpl {
    cache: Option<Arc<dyn CacheClearable>>,
}

impl CacheServiceImpl {
    pub fn new(cache: Option<Arc<dyn CacheClearable>>) -> Self {
        Self { cache }
    }
}

/// Anything `ClearCache` can clear — the tool-result cache and the
/// caching sampler both qualify.
#[tonic::async_trait]
pub trait CacheClearable: Send + Sync {
    async fn clear(&self);
}

#[tonic::async_trait]
impl CacheClearable for mcprouter_managers::CachingMiddleware {
    async fn clear(&self) {
        mcprouter_managers::CachingMiddleware::clear(self).await;
    }
}

#[tonic::async_trait]
impl proto::cache_service_server::CacheService for CacheServiceImpl {
    async fn clear_cache(
        &self,
        _request: Request<proto::ClearCacheRequest>,
    ) -> Result<Response<proto::ClearCacheResponse>, Status> {
        match &self.cache {
            Some(cache) => {
                cache.clear().await;
                Ok(Response::new(proto::ClearCacheResponse {}))
            }
            None => Err(Status::failed_precondition("no cache is configured")),
        }
    }
}
