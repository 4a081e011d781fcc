//! Registry (spec.md §4.F): maps workflow/activity names to callable
//! values. Rust has no runtime reflection over arbitrary function
//! signatures (unlike the original's `reflect.ValueOf(activity)`), so both
//! kinds are represented as payload-in/payload-out closures; argument
//! binding happens inside the closure via `workflow_types::Converter`.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{BoxFuture, LocalBoxFuture};
use thiserror::Error;

use workflow_types::{ExecutionError, Payload};

use crate::ctx::WorkflowCtx;

/// A registered workflow function. Not `Send`: it runs entirely inside one
/// executor's single-threaded cooperative scheduler.
pub type WorkflowFn = Rc<dyn Fn(WorkflowCtx, Payload) -> LocalBoxFuture<'static, Result<Payload, ExecutionError>>>;

/// A registered activity function. `Send + Sync`: activities run on the
/// host's activity execution pool (out of scope here, spec.md §1), which
/// may dispatch them to any worker thread.
pub type ActivityFn = Arc<dyn Fn(Payload) -> BoxFuture<'static, Result<Payload, ExecutionError>> + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("workflow not registered: {0}")]
    UnknownWorkflow(String),
    #[error("activity not registered: {0}")]
    UnknownActivity(String),
    #[error("workflow already registered: {0}")]
    DuplicateWorkflow(String),
    #[error("activity already registered: {0}")]
    DuplicateActivity(String),
}

/// Name → callable table (spec.md §4.F). Registration is expected to
/// happen once at worker startup, before any task is executed.
#[derive(Default, Clone)]
pub struct Registry {
    workflows: HashMap<String, WorkflowFn>,
    activities: HashMap<String, ActivityFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_workflow(&mut self, name: impl Into<String>, f: WorkflowFn) -> Result<(), RegistryError> {
        let name = name.into();
        if self.workflows.contains_key(&name) {
            return Err(RegistryError::DuplicateWorkflow(name));
        }
        self.workflows.insert(name, f);
        Ok(())
    }

    pub fn register_activity(&mut self, name: impl Into<String>, f: ActivityFn) -> Result<(), RegistryError> {
        let name = name.into();
        if self.activities.contains_key(&name) {
            return Err(RegistryError::DuplicateActivity(name));
        }
        self.activities.insert(name, f);
        Ok(())
    }

    pub fn lookup_workflow(&self, name: &str) -> Result<WorkflowFn, RegistryError> {
        self.workflows
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownWorkflow(name.to_string()))
    }

    pub fn lookup_activity(&self, name: &str) -> Result<ActivityFn, RegistryError> {
        self.activities
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownActivity(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_workflow() -> WorkflowFn {
        Rc::new(|_ctx, _input| Box::pin(async { Ok(Payload::new(Vec::new(), workflow_types::Codec::Json)) }))
    }

    #[test]
    fn lookup_miss_reports_unknown_workflow() {
        let registry = Registry::new();
        assert_eq!(
            registry.lookup_workflow("missing").unwrap_err(),
            RegistryError::UnknownWorkflow("missing".into())
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry.register_workflow("w", noop_workflow()).unwrap();
        assert_eq!(
            registry.register_workflow("w", noop_workflow()).unwrap_err(),
            RegistryError::DuplicateWorkflow("w".into())
        );
    }

    #[test]
    fn registered_workflow_is_found_by_name() {
        let mut registry = Registry::new();
        registry.register_workflow("w", noop_workflow()).unwrap();
        assert!(registry.lookup_workflow("w").is_ok());
    }
}
