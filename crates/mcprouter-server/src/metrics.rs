// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Metric emission helpers. Every call site goes
//! through these functions so a label can never accidentally be
//! dropped — an unlabeled `tools.call.total` would double-count in a
//! Prometheus-style scraper.

use std::time::Duration;

pub fn tools_list_total() {
    metrics::counter!("tools.list.total").increment(1);
}

pub fn tools_call_total(tool: &str, service_id: &str) {
    metrics::counter!("tools.call.total", "tool" => tool.to_string(), "service_id" => service_id.to_string())
        .increment(1);
}

pub fn tools_call_errors(tool: &str, service_id: &str) {
    metrics::counter!("tools.call.errors", "tool" => tool.to_string(), "service_id" => service_id.to_string())
        .increment(1);
}

pub fn tools_call_latency(tool: &str, service_id: &str, elapsed: Duration) {
    metrics::histogram!("tools.call.latency", "tool" => tool.to_string(), "service_id" => service_id.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn grpc_rpc_started() {
    metrics::counter!("grpc.rpc.started.total").increment(1);
}

pub fn grpc_rpc_finished() {
    metrics::counter!("grpc.rpc.finished.total").increment(1);
}

pub fn grpc_connection_opened() {
    metrics::counter!("grpc.connections.opened.total").increment(1);
}

pub fn grpc_connection_closed() {
    metrics::counter!("grpc.connections.closed.total").increment(1);
}

/// RAII timer for `tools.call.latency`: sampled on completion
/// regardless of success/failure, step 4.
pub struct CallTimer {
    tool: String,
    service_id: String,
    start: std::time::Instant,
}

impl CallTimer {
    pub fn start(tool: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            service_id: service_id.into(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        tools_call_latency(&self.tool, &self.service_id, self.start.elapsed());
    }
}
