// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! MIME classification for skill assets.

use std::path::Path;

/// Fallback MIME type when extension-based lookup comes up empty.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Guess a MIME type from a file's extension, falling back to
/// [`FALLBACK_MIME`] when the extension is unknown or absent.
pub fn classify(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// Whether a MIME type should be surfaced as `text` rather than `blob`
/// in a [`mcprouter_core::ResourceContents`], step 6.
pub fn is_text_like(mime_type: &str) -> bool {
    let base = mime_type.split(';').next().unwrap_or(mime_type).trim();
    base.starts_with("text/")
        || matches!(
            base,
            "application/json"
                | "application/xml"
                | "application/yaml"
                | "application/x-yaml"
                | "application/javascript"
                | "application/ecmascript"
        )
}
