// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Catalog stand-ins that never leak state, used by `ValidateService`
//! so a validation run cannot mutate the real catalogs.

use mcprouter_core::{Prompt, Resource};

/// A prompt manager that discards every write and returns nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPromptManager;

impl NoOpPromptManager {
    pub fn add(&self, _prompt: Prompt) {}
    pub fn get(&self, _composite_id: &str) -> Option<Prompt> {
        None
    }
    pub fn list(&self) -> Vec<Prompt> {
        Vec::new()
    }
    pub fn clear_for_service(&self, _service_id: &str) {}
}

/// A resource manager that discards every write and returns nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpResourceManager;

impl NoOpResourceManager {
    pub fn add(&self, _resource: Resource) {}
    pub fn get(&self, _uri: &str) -> Option<Resource> {
        None
    }
    pub fn list(&self) -> Vec<Resource> {
        Vec::new()
    }
    pub fn clear_for_service(&self, _service_id: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn noop_prompt_manager_discards_everything() {
        let mgr = NoOpPromptManager;
        mgr.add(Prompt {
            name: "p".into(),
            service_id: "s".into(),
            argument_schema: json!({}),
        });
        assert!(mgr.list().is_empty());
        assert!(mgr.get("s.p").is_none());
    }

    #[test]
    fn noop_resource_manager_discards_everything() {
        let mgr = NoOpResourceManager;
        mgr.add(Resource {
            uri: "s://r".into(),
            service_id: "s".into(),
            mime_type: "text/plain".into(),
            description: String::new(),
        });
        assert!(mgr.list().is_empty());
        assert!(mgr.get("s://r").is_none());
    }
}
