// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message traveling over the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Topic this envelope was published on.
    pub topic: String,
    /// Correlation id for request/response matching, if any.
    pub correlation_id: Option<String>,
    /// The message body.
    pub payload: Value,
}

impl Envelope {
    /// Build an envelope with no correlation id.
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            correlation_id: None,
            payload,
        }
    }

    /// Build an envelope carrying a correlation id.
    pub fn with_correlation(
        topic: impl Into<String>,
        correlation_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            topic: topic.into(),
            correlation_id: Some(correlation_id.into()),
            payload,
        }
    }
}
