pub mod api;
pub mod model;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use insure_core::Module;

use service::PolicyService;

/// Policy module: core records, supplements and tabular upload.
pub struct PolicyModule {
    service: Arc<PolicyService>,
    max_upload_bytes: usize,
}

impl PolicyModule {
    pub fn new(service: PolicyService) -> Self {
        Self {
            service: Arc::new(service),
            max_upload_bytes: api::upload::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Cap the body size accepted by `/upload`.
    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

impl Module for PolicyModule {
    fn name(&self) -> &str {
        "policy"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone(), self.max_upload_bytes)
    }
}
