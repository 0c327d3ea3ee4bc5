// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Bus topic names for the registration pipeline.

pub const SERVICE_REGISTRATION_REQUESTS: &str = "service_registration_requests";
pub const SERVICE_REGISTRATION_RESULTS: &str = "service_registration_results";
pub const SERVICE_GET_REQUESTS: &str = "service_get_requests";
pub const SERVICE_GET_RESULTS: &str = "service_get_results";
pub const SERVICE_LIST_REQUESTS: &str = "service_list_requests";
pub const SERVICE_LIST_RESULTS: &str = "service_list_results";
