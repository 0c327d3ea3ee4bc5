// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Composite tool id construction and parsing.
//!
//! The externally visible tool name is `"<service_id>.<sanitized(name)>"`.
//! Sanitization maps any character outside `[A-Za-z0-9_]` plus `:` to
//! `_`, which guarantees the result never contains a literal `.` and so
//! splitting on the first `.` to recover `(service_id, name)` is always
//! unambiguous as long as `service_id` itself is also sanitized or
//! known not to contain `.` (callers are expected to supply sanitized
//! service ids; this module does not second-guess them).

/// Replace every character outside `[A-Za-z0-9_]` plus `:` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the composite id `"<service_id>.<sanitized(name)>"`.
pub fn composite_tool_id(service_id: &str, name: &str) -> String {
    format!("{service_id}.{}", sanitize_name(name))
}

/// Split a composite id back into `(service_id, sanitized_name)`.
///
/// Splits on the *first* `.`, since `sanitize_name` never emits a `.`
/// in the name portion.
pub fn parse_composite_tool_id(id: &str) -> Option<(&str, &str)> {
    id.split_once('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_dots_and_specials() {
        assert_eq!(sanitize_name("get.weather"), "get_weather");
        assert_eq!(sanitize_name("a b/c"), "a_b_c");
        assert_eq!(sanitize_name("already_ok:123"), "already_ok:123");
    }

    #[test]
    fn composite_id_round_trips() {
        let id = composite_tool_id("weather-svc", "get.forecast");
        assert_eq!(id, "weather-svc.get_forecast");
        let (svc, name) = parse_composite_tool_id(&id).unwrap();
        assert_eq!(svc, "weather-svc");
        assert_eq!(name, "get_forecast");
    }

    #[test]
    fn parsing_is_unambiguous_even_with_dotted_names() {
        // sanitize_name guarantees the name half never contains '.',
        // so the first '.' in the composite id is always the separator.
        let id = composite_tool_id("svc", "a.b.c");
        assert_eq!(id, "svc.a_b_c");
        assert_eq!(parse_composite_tool_id(&id), Some(("svc", "a_b_c")));
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert_eq!(parse_composite_tool_id("no-dot-here"), None);
    }
}
