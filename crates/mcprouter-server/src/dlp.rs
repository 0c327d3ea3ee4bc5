// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! DLP middleware: inspects outgoing payloads after
//! every downstream handler has run and redacts values whose key
//! matches an externally-provided predicate.

use std::sync::Arc;

use async_trait::async_trait;
use mcprouter_core::{CoreError, ExecutionContext};
use serde_json::Value;

use crate::chain::{McpMiddleware, McpNext, McpRequest};
use crate::redact::is_sensitive_key;

/// Decides whether a JSON object key names a sensitive value. Boxed so
/// callers can supply their own pattern list instead of the built-in
/// one used for log redaction.
pub trait DlpPredicate: Send + Sync {
    fn is_sensitive(&self, key: &str) -> bool;
}

/// The same key list [`crate::redact::LazyRedact`] uses for logs,
/// reused here so "what gets redacted from a client response" and
/// "what gets redacted from a log line" stay in lockstep by default.
pub struct DefaultDlpPredicate;

impl DlpPredicate for DefaultDlpPredicate {
    fn is_sensitive(&self, key: &str) -> bool {
        is_sensitive_key(key)
    }
}

pub struct DlpMiddleware {
    predicate: Arc<dyn DlpPredicate>,
}

impl DlpMiddleware {
    pub fn new(predicate: Arc<dyn DlpPredicate>) -> Self {
        Self { predicate }
    }
}

impl Default for DlpMiddleware {
    fn default() -> Self {
        Self::new(Arc::new(DefaultDlpPredicate))
    }
}

#[async_trait]
impl McpMiddleware for DlpMiddleware {
    async fn handle(&self, req: McpRequest, next: McpNext<'_>) -> Result<Value, CoreError> {
        let mut value = next.run(req).await?;
        redact_in_place(&mut value, self.predicate.as_ref());
        Ok(value)
    }

    fn name(&self) -> &'static str {
        "dlp"
    }
}

fn redact_in_place(value: &mut Value, predicate: &dyn DlpPredicate) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if predicate.is_sensitive(key) {
                    *v = Value::String("[REDACTED]".to_string());
                } else {
                    redact_in_place(v, predicate);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_in_place(item, predicate);
            }
        }
        _ => {}
    }
}
