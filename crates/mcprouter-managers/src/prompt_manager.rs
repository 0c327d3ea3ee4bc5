// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The prompt catalog.

use std::sync::{Arc, RwLock, Weak};

use dashmap::DashMap;
use mcprouter_core::{CoreError, ExecutionContext, Prompt, PromptEvaluator, PromptMessage};

use crate::provider::{ListChangeKind, McpServerProvider};

pub struct PromptManager {
    prompts: DashMap<String, Prompt>,
    evaluators: DashMap<String, Arc<dyn PromptEvaluator>>,
    server: RwLock<Option<Weak<dyn McpServerProvider>>>,
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptManager {
    pub fn new() -> Self {
        Self {
            prompts: DashMap::new(),
            evaluators: DashMap::new(),
            server: RwLock::new(None),
        }
    }

    /// Register prompt metadata only, with no `evaluate` capability
    /// attached. `evaluate` on such a prompt fails with `NotFound`.
    pub fn add(&self, prompt: Prompt) {
        self.prompts.insert(prompt.composite_id(), prompt);
        self.notify();
    }

    /// Register a prompt together with the capability that renders it
    /// (: Prompt is `{name, service_id, argument_schema}` plus
    /// an `evaluate(arguments) → messages` operation).
    pub fn add_with_evaluator(&self, prompt: Prompt, evaluator: Arc<dyn PromptEvaluator>) {
        let id = prompt.composite_id();
        self.evaluators.insert(id.clone(), evaluator);
        self.prompts.insert(id, prompt);
        self.notify();
    }

    pub fn get(&self, composite_id: &str) -> Option<Prompt> {
        self.prompts.get(composite_id).map(|e| e.value().clone())
    }

    pub fn list(&self) -> Vec<Prompt> {
        self.prompts.iter().map(|e| e.value().clone()).collect()
    }

    pub fn clear_for_service(&self, service_id: &str) {
        let removed: Vec<String> = self
            .prompts
            .iter()
            .filter(|e| e.value().service_id == service_id)
            .map(|e| e.key().clone())
            .collect();
        for id in &removed {
            self.evaluators.remove(id);
        }
        self.prompts.retain(|_, p| p.service_id != service_id);
        self.notify();
    }

    /// `prompts/get`'s manager-side half: resolve the prompt, then its
    /// evaluator, and render it.
    pub async fn evaluate(
        &self,
        ctx: ExecutionContext,
        composite_id: &str,
        arguments: serde_json::Value,
    ) -> Result<Vec<PromptMessage>, CoreError> {
        if self.get(composite_id).is_none() {
            return Err(CoreError::NotFound(format!(
                "no prompt registered for id {composite_id}"
            )));
        }
        let evaluator = self.evaluators.get(composite_id).map(|e| e.value().clone());
        match evaluator {
            Some(evaluator) => evaluator.evaluate(ctx, arguments).await,
            None => Err(CoreError::NotFound(format!(
                "prompt {composite_id} has no evaluator configured"
            ))),
        }
    }

    pub fn set_mcp_server(&self, server: Weak<dyn McpServerProvider>) {
        *self.server.write().unwrap() = Some(server);
    }

    fn notify(&self) {
        if let Some(provider) = self.server.read().unwrap().as_ref().and_then(Weak::upgrade) {
            provider.notify_list_changed(ListChangeKind::Prompts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt(service_id: &str, name: &str) -> Prompt {
        Prompt {
            name: name.to_string(),
            service_id: service_id.to_string(),
            argument_schema: json!({}),
        }
    }

    #[test]
    fn add_get_clear_round_trip() {
        let mgr = PromptManager::new();
        mgr.add(prompt("svc", "greet"));
        assert!(mgr.get("svc.greet").is_some());
        mgr.clear_for_service("svc");
        assert!(mgr.get("svc.greet").is_none());
        assert_eq!(mgr.list().len(), 0);
    }

    #[test]
    fn clear_for_service_is_idempotent() {
        let mgr = PromptManager::new();
        mgr.add(prompt("svc", "greet"));
        mgr.clear_for_service("svc");
        mgr.clear_for_service("svc");
        assert_eq!(mgr.list().len(), 0);
    }

    #[tokio::test]
    async fn evaluate_without_evaluator_is_not_found() {
        let mgr = PromptManager::new();
        mgr.add(prompt("svc", "greet"));
        let err = mgr
            .evaluate(ExecutionContext::default(), "svc.greet", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn evaluate_missing_prompt_is_not_found() {
        let mgr = PromptManager::new();
        let err = mgr
            .evaluate(ExecutionContext::default(), "svc.missing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn evaluate_dispatches_to_registered_evaluator() {
        use mcprouter_core::testing::StaticPromptEvaluator;
        use mcprouter_core::PromptRole;

        let mgr = PromptManager::new();
        let messages = vec![PromptMessage {
            role: PromptRole::User,
            text: "hello".to_string(),
        }];
        mgr.add_with_evaluator(
            prompt("svc", "greet"),
            Arc::new(StaticPromptEvaluator::returning(messages)),
        );

        let out = mgr
            .evaluate(ExecutionContext::default(), "svc.greet", json!({}))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);

        mgr.clear_for_service("svc");
        let err = mgr
            .evaluate(ExecutionContext::default(), "svc.greet", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
