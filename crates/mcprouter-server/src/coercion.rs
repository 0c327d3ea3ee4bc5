// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Result coercion: turn whatever a tool's `execute`
//! returned into a wire-shaped `CallToolResult`, plus the marshaled
//! bytes reused for the redacted log value so the result is never
//! serialized twice.

use base64::Engine;
use mcprouter_core::ToolOutcome;
use rmcp::model::{CallToolResult, Content, ResourceContents};
use serde_json::{Map, Value};

/// The coerced result plus the canonical JSON bytes behind it, so
/// logging can reuse the same marshal.
pub struct Coerced {
    pub result: CallToolResult,
    /// `None` for outcomes that were already shaped ((a)) — there is
    /// nothing to marshal in that case.
    pub marshaled: Option<Vec<u8>>,
}

pub fn coerce(outcome: ToolOutcome) -> Coerced {
    match outcome {
        ToolOutcome::Shaped(result) => Coerced {
            result,
            marshaled: None,
        },
        ToolOutcome::Map(map) => match coerce_map(&map) {
            Some(result) => Coerced {
                result,
                marshaled: None,
            },
            None => fallback(Value::Object(map)),
        },
        ToolOutcome::Other(value) => fallback(value),
    }
}

fn fallback(value: Value) -> Coerced {
    let bytes = serde_json::to_vec(&value).unwrap_or_default();
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Coerced {
        result: CallToolResult::success(vec![Content::text(text)]),
        marshaled: Some(bytes),
    }
}

/// Rule (b): a map resembling `{content, isError}`. Parses the map
/// directly without a JSON round-trip. Returns `None` if the fast path
/// doesn't apply, in which case the caller falls through per spec
/// (plain-string `content` wrapped as a single text part, else JSON
/// round-trip).
fn coerce_map(map: &Map<String, Value>) -> Option<CallToolResult> {
    let is_error = map.get("isError").and_then(Value::as_bool).unwrap_or(false);

    match map.get("content") {
        Some(Value::Array(items)) => {
            let mut content = Vec::with_capacity(items.len());
            for item in items {
                content.push(coerce_content_item(item)?);
            }
            Some(shaped(content, is_error))
        }
        Some(Value::String(text)) => Some(shaped(vec![Content::text(text.clone())], is_error)),
        Some(_) => None,
        None if map.contains_key("isError") => Some(shaped(Vec::new(), is_error)),
        None => None,
    }
}

fn shaped(content: Vec<Content>, is_error: bool) -> CallToolResult {
    if is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

fn coerce_content_item(item: &Value) -> Option<Content> {
    match item.get("type")?.as_str()? {
        "text" => Some(Content::text(item.get("text")?.as_str()?.to_string())),
        "image" => {
            let data = item.get("data")?.as_str()?.to_string();
            let mime_type = item.get("mimeType")?.as_str()?.to_string();
            // Validate decodability without keeping the decoded bytes:
            // the wire format wants the same base64 string back.
            base64::engine::general_purpose::STANDARD.decode(&data).ok()?;
            Some(Content::image(data, mime_type))
        }
        "resource" => coerce_resource_item(item),
        _ => None,
    }
}

fn coerce_resource_item(item: &Value) -> Option<Content> {
    let resource = item.get("resource")?;
    let uri = resource.get("uri")?.as_str()?.to_string();
    let mime_type = resource
        .get("mimeType")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(text) = resource.get("text").and_then(Value::as_str) {
        return Some(Content::resource(ResourceContents::TextResourceContents {
            uri,
            mime_type,
            text: text.to_string(),
        }));
    }

    let blob_b64 = match resource.get("blob") {
        Some(Value::String(b64)) => {
            base64::engine::general_purpose::STANDARD.decode(b64).ok()?;
            b64.clone()
        }
        Some(Value::Array(bytes)) => {
            let raw: Option<Vec<u8>> = bytes.iter().map(|b| b.as_u64().map(|n| n as u8)).collect();
            base64::engine::general_purpose::STANDARD.encode(raw?)
        }
        _ => return None,
    };

    Some(Content::resource(ResourceContents::BlobResourceContents {
        uri,
        mime_type,
        blob: blob_b64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaped_outcome_passes_through() {
        let result = CallToolResult::success(vec![Content::text("hello".to_string())]);
        let coerced = coerce(ToolOutcome::Shaped(result));
        assert!(coerced.marshaled.is_none());
    }

    #[test]
    fn map_with_text_content_fast_paths() {
        let map = serde_json::json!({
            "content": [{"type": "text", "text": "hi"}],
            "isError": false
        })
        .as_object()
        .unwrap()
        .clone();
        let coerced = coerce(ToolOutcome::Map(map));
        assert!(coerced.marshaled.is_none());
        assert_eq!(coerced.result.is_error, Some(false));
    }

    #[test]
    fn map_with_resource_blob_round_trips_bytes() {
        let bytes = b"test-data";
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let map = serde_json::json!({
            "content": [{
                "type": "resource",
                "resource": {"uri": "test://blob", "mimeType": "application/octet-stream", "blob": b64}
            }]
        })
        .as_object()
        .unwrap()
        .clone();
        let coerced = coerce(ToolOutcome::Map(map));
        assert!(coerced.marshaled.is_none());
        assert!(coerced.result.is_error.is_none() || coerced.result.is_error == Some(false));
    }

    #[test]
    fn plain_string_content_wraps_in_single_text_part() {
        let map = serde_json::json!({"content": "just a string", "isError": true})
            .as_object()
            .unwrap()
            .clone();
        let coerced = coerce(ToolOutcome::Map(map));
        assert_eq!(coerced.result.is_error, Some(true));
        assert!(coerced.marshaled.is_none());
    }

    #[test]
    fn unknown_content_type_falls_through_to_json_wrap() {
        let map = serde_json::json!({"content": [{"type": "unknown"}]})
            .as_object()
            .unwrap()
            .clone();
        let coerced = coerce(ToolOutcome::Map(map));
        assert!(coerced.marshaled.is_some());
    }

    #[test]
    fn other_value_is_json_wrapped_in_single_text_part() {
        let coerced = coerce(ToolOutcome::Other(serde_json::json!({"a": 1})));
        assert!(coerced.marshaled.is_some());
        assert_eq!(coerced.result.content.unwrap().len(), 1);
    }
}
