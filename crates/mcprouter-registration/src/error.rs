// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! `CoreError` → `tonic::Status` conversion at the gRPC boundary (spec
//! §6 error-code mapping table).

use mcprouter_core::CoreError;
use tonic::Status;

/// Map a domain error onto the `tonic::Status` code the admin surface
/// promises in : "missing required argument → `InvalidArgument`;
/// not found → `NotFound`; deadline hit → `DeadlineExceeded`;
/// worker-reported failure → `Internal`; caller unauthenticated →
/// `Unauthenticated`; caching not configured → `FailedPrecondition`."
pub fn core_error_to_status(err: CoreError) -> Status {
    match err {
        CoreError::InvalidArgument(msg) => Status::invalid_argument(msg),
        CoreError::NotFound(msg) => Status::not_found(msg),
        CoreError::Timeout(msg) => Status::deadline_exceeded(msg),
        CoreError::AccessDenied(msg) => Status::permission_denied(msg),
        CoreError::Unhealthy(msg) => Status::unavailable(msg),
        CoreError::InvalidPath(msg) | CoreError::ResourceTooLarge(msg) => Status::internal(msg),
        CoreError::NoSession => Status::failed_precondition("no session available"),
        CoreError::Upstream(msg) => Status::internal(format!("worker-reported failure: {msg}")),
        CoreError::Other(err) => Status::internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn maps_the_documented_codes() {
        assert_eq!(
            core_error_to_status(CoreError::InvalidArgument("x".into())).code(),
            Code::InvalidArgument
        );
        assert_eq!(
            core_error_to_status(CoreError::NotFound("x".into())).code(),
            Code::NotFound
        );
        assert_eq!(
            core_error_to_status(CoreError::Timeout("x".into())).code(),
            Code::DeadlineExceeded
        );
        assert_eq!(
            core_error_to_status(CoreError::Upstream("x".into())).code(),
            Code::Internal
        );
        assert_eq!(
            core_error_to_status(CoreError::NoSession).code(),
            Code::FailedPrecondition
        );
    }
}
