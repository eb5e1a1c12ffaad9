//! Ordered chain of admission stages.
//!
//! Each stage either lets the request through to the next one or ends the chain
//! with a [`Rejection`]. The downstream handler only runs once every stage has
//! passed.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Rejection;
use crate::models::RequestDescriptor;

/// One filtering step in front of the handler.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, request: &RequestDescriptor) -> Result<(), Rejection>;
}

#[derive(Clone, Default)]
pub struct AdmissionGate {
    stages: Vec<Arc<dyn Stage>>,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    // stages run in the order they were added
    pub fn then(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn check(&self, request: &RequestDescriptor) -> Result<(), Rejection> {
        for stage in &self.stages {
            if let Err(rejection) = stage.check(request) {
                warn!(
                    stage = stage.name(),
                    client = %request.client,
                    method = %request.method,
                    path = %request.path,
                    kind = rejection.kind(),
                    "request rejected"
                );
                return Err(rejection);
            }
        }
        debug!(client = %request.client, path = %request.path, "request admitted");
        Ok(())
    }

    /// Runs the chain and, only if every stage admits, the rest of the pipeline.
    pub async fn run<F, Fut>(&self, request: &RequestDescriptor, next: F) -> Result<Fut::Output, Rejection>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.check(request)?;
        Ok(next().await)
    }
}
