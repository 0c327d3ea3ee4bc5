// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Lazy, "compute on write" log value wrappers. Neither
//! wrapper does any work unless something actually calls `render`:
//! wrap these in `tracing`'s `%`/`?` only behind a level check, or hand
//! them to `tracing::field::debug` so the formatter (not the call
//! site) decides whether to touch them.

use std::fmt;

/// Keys (case-insensitive) whose string values get replaced wholesale.
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "access_key",
    "private_key",
    "authorization",
    "credential",
];

/// Byte budget for the redaction scan. A pathological multi-megabyte
/// key cannot stall the logger; past this point the remainder of the
/// value is redacted outright rather than scanned further.
const SCAN_BUDGET_BYTES: usize = 1_000_000;

/// Wraps raw JSON bytes (request arguments, raw upstream results) and
/// defers the redacting scan until [`fmt::Display`]/[`fmt::Debug`] is
/// actually invoked.
pub struct LazyRedact<'a> {
    json: &'a [u8],
}

impl<'a> LazyRedact<'a> {
    pub fn new(json: &'a [u8]) -> Self {
        Self { json }
    }

    /// Run the redaction scan eagerly and materialize the result.
    /// Prefer using `Display`/`Debug` through a `tracing` field so this
    /// never runs when the log level is disabled.
    pub fn render(&self) -> String {
        redact_json_str(self.json)
    }
}

impl fmt::Display for LazyRedact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for LazyRedact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A tiny character-scanning JSON lexer state, enough to track "am I
/// inside a string, and if so which key am I inside the value of."
/// Never builds a full parse tree — only as much state as redaction
/// needs, so a huge payload costs one linear pass, not an allocation
/// tree.
fn redact_json_str(json: &[u8]) -> String {
    // Decode as UTF-8 lossily; malformed input still gets scanned
    // byte-for-byte so we never panic on untrusted input.
    let text = String::from_utf8_lossy(json);
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut budget = SCAN_BUDGET_BYTES;

    while i < bytes.len() {
        if budget == 0 {
            // Budget exhausted: redact everything remaining rather
            // than risk leaking a value we stopped scanning.
            out.push_str("[REDACTED]");
            break;
        }
        if bytes[i] == b'"' {
            let (key, consumed) = scan_json_string(bytes, i);
            out.push('"');
            out.push_str(&key);
            out.push('"');
            i += consumed;
            budget = budget.saturating_sub(consumed);

            // Skip whitespace and a single ':' to see whether this
            // string was a key.
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b':' {
                j += 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                out.push_str(&text[i..j]);
                i = j;

                if is_sensitive_key(&key) {
                    if i < bytes.len() && bytes[i] == b'"' {
                        let (_, value_consumed) = scan_json_string(bytes, i);
                        out.push_str("\"[REDACTED]\"");
                        i += value_consumed;
                        budget = budget.saturating_sub(value_consumed);
                    } else {
                        // Non-string sensitive value (number/bool/null/object/array):
                        // redact the whole literal span conservatively.
                        let (consumed, literal_is_container) = scan_json_value_span(bytes, i);
                        if literal_is_container {
                            // Uncertain how to redact structurally; fail safe.
                            out.push_str("\"[REDACTED]\"");
                        } else {
                            out.push_str("\"[REDACTED]\"");
                        }
                        i += consumed;
                        budget = budget.saturating_sub(consumed);
                    }
                }
            }
            continue;
        }

        // Tolerate `//` line comments: copy them through as payload,
        // not structure, so they can't desynchronize the scanner.
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            out.push_str(&text[start..i]);
            continue;
        }

        // Structural JSON characters (braces, commas, whitespace,
        // numbers, `true`/`false`/`null`) are always ASCII; anything
        // non-ASCII here is multi-byte UTF-8 that must be copied as a
        // whole `char`, not byte-by-byte, to avoid corrupting it.
        let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
        let ch_len = ch.len_utf8();
        out.push(ch);
        i += ch_len;
        budget = budget.saturating_sub(ch_len);
    }

    out
}

/// Scan a JSON string starting at `start` (which must point at the
/// opening `"`). Returns the decoded string (with `\uXXXX` escapes
/// resolved so a key containing `a` compares equal to `"a"`) and
/// the number of bytes consumed including both quotes.
fn scan_json_string(bytes: &[u8], start: usize) -> (String, usize) {
    debug_assert_eq!(bytes[start], b'"');
    let mut i = start + 1;
    let mut decoded = String::new();
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                return (decoded, i - start);
            }
            b'\\' if i + 1 < bytes.len() => {
                match bytes[i + 1] {
                    b'u' if i + 5 < bytes.len() => {
                        if let Ok(hex) = std::str::from_utf8(&bytes[i + 2..i + 6]) {
                            if let Ok(code) = u32::from_str_radix(hex, 16) {
                                if let Some(ch) = char::from_u32(code) {
                                    decoded.push(ch);
                                }
                            }
                        }
                        i += 6;
                    }
                    b'n' => {
                        decoded.push('\n');
                        i += 2;
                    }
                    b't' => {
                        decoded.push('\t');
                        i += 2;
                    }
                    b'"' => {
                        decoded.push('"');
                        i += 2;
                    }
                    b'\\' => {
                        decoded.push('\\');
                        i += 2;
                    }
                    other => {
                        decoded.push(other as char);
                        i += 2;
                    }
                }
            }
            _ => {
                // Raw (non-escaped) UTF-8 content, possibly multi-byte.
                let ch = std::str::from_utf8(&bytes[i..])
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or('\u{FFFD}');
                let ch_len = ch.len_utf8();
                decoded.push(ch);
                i += ch_len;
            }
        }
    }
    // Unterminated string (malformed input): treat the rest as the value.
    (decoded, i - start)
}

/// Scan a non-string JSON value span (number, bool, null, object,
/// array) for the purpose of skipping/redacting it wholesale. Returns
/// `(bytes_consumed, is_container)`.
fn scan_json_value_span(bytes: &[u8], start: usize) -> (usize, bool) {
    if start >= bytes.len() {
        return (0, false);
    }
    match bytes[start] {
        b'{' | b'[' => {
            let open = bytes[start];
            let close = if open == b'{' { b'}' } else { b']' };
            let mut depth = 0i32;
            let mut i = start;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => {
                        let (_, consumed) = scan_json_string(bytes, i);
                        i += consumed;
                        continue;
                    }
                    b if b == open => depth += 1,
                    b if b == close => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            return (i - start, true);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            (i - start, true)
        }
        _ => {
            let mut i = start;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'}' | b']') {
                i += 1;
            }
            (i - start, false)
        }
    }
}

pub(crate) fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|k| lower == *k || lower.contains(k))
}

/// Summarizes a coerced tool result for logging, never dumping raw
/// content. When the caller already marshaled the
/// `Other` outcome for the coercion fallback, it passes those same
/// bytes through `with_marshaled` so the JSON is never serialized a
/// second time for the same result.
pub struct LazyLogResult<'a> {
    outcome: &'a mcprouter_core::ToolOutcome,
    marshaled: Option<&'a [u8]>,
}

impl<'a> LazyLogResult<'a> {
    pub fn new(outcome: &'a mcprouter_core::ToolOutcome) -> Self {
        Self {
            outcome,
            marshaled: None,
        }
    }

    pub fn with_marshaled(outcome: &'a mcprouter_core::ToolOutcome, marshaled: Option<&'a [u8]>) -> Self {
        Self { outcome, marshaled }
    }

    pub fn render(&self) -> String {
        use mcprouter_core::ToolOutcome;
        match self.outcome {
            ToolOutcome::Shaped(result) => summarize_call_tool_result(result),
            ToolOutcome::Map(map) => {
                summarize_call_tool_result_value(&serde_json::Value::Object(map.clone()))
            }
            ToolOutcome::Other(value) => match self.marshaled {
                Some(bytes) => LazyRedact::new(bytes).render(),
                None => {
                    let bytes = serde_json::to_vec(value).unwrap_or_default();
                    LazyRedact::new(&bytes).render()
                }
            },
        }
    }
}

impl fmt::Display for LazyLogResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn summarize_call_tool_result(result: &rmcp::model::CallToolResult) -> String {
    let Some(content) = result.content.as_ref() else {
        return format!("CallToolResult(is_error={:?}, content=none)", result.is_error);
    };
    let parts: Vec<String> = content
        .iter()
        .map(|c| summarize_content(&serde_json::to_value(c).unwrap_or_default()))
        .collect();
    format!(
        "CallToolResult(is_error={:?}) [{}]",
        result.is_error,
        parts.join(", ")
    )
}

fn summarize_call_tool_result_value(value: &serde_json::Value) -> String {
    let content = value.get("content").and_then(|c| c.as_array());
    let is_error = value.get("isError").and_then(|v| v.as_bool());
    match content {
        Some(items) => {
            let parts: Vec<String> = items.iter().map(summarize_content).collect();
            format!("CallToolResult(is_error={is_error:?}) [{}]", parts.join(", "))
        }
        None => format!("CallToolResult(is_error={is_error:?}, content=none)"),
    }
}

fn summarize_content(item: &serde_json::Value) -> String {
    match item.get("type").and_then(|t| t.as_str()) {
        Some("text") => {
            let text = item.get("text").and_then(|t| t.as_str()).unwrap_or("");
            let truncated: String = text.chars().take(512).collect();
            format!("Text(len={}): \"{}\"", text.len(), truncated)
        }
        Some("image") => {
            let mime = item.get("mimeType").and_then(|t| t.as_str()).unwrap_or("unknown");
            let size = item
                .get("data")
                .and_then(|d| d.as_str())
                .map(|d| d.len())
                .unwrap_or(0);
            format!("Image(mime={mime}, size={size} bytes)")
        }
        Some("resource") => {
            let resource = item.get("resource").unwrap_or(item);
            let uri = resource.get("uri").and_then(|u| u.as_str()).unwrap_or("unknown");
            if let Some(blob) = resource.get("blob").and_then(|b| b.as_str()) {
                format!("Resource(uri={uri}) [blob={} bytes]", blob.len())
            } else if let Some(text) = resource.get("text").and_then(|t| t.as_str()) {
                format!("Resource(uri={uri}) [text={} chars]", text.chars().count())
            } else {
                format!("Resource(uri={uri}) [empty]")
            }
        }
        other => format!("Content(type={other:?})"),
    }
}
