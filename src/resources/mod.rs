//! Resource lifecycle
//!
//! A resource renders Kubernetes manifests into the caller's state. Nothing
//! is applied to a cluster, so `read` and `delete` have nothing to do.

pub mod clock;
pub mod crd_resource;
pub mod model;

pub use clock::{Clock, IdStamp, SystemClock};
pub use crd_resource::CrdResource;
pub use model::{resource_schema, MetadataModel, ResourceModel};

use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;

#[derive(Clone, Debug)]
pub struct CreateRequest {
    pub config: Value,
}

#[derive(Clone, Debug)]
pub struct ReadRequest {
    pub state: Value,
}

#[derive(Clone, Debug)]
pub struct UpdateRequest {
    pub config: Value,
    pub prior_state: Value,
}

#[derive(Clone, Debug)]
pub struct DeleteRequest {
    pub state: Value,
}

/// Result of create and update
#[derive(Clone, Debug, Default)]
pub struct ApplyResponse {
    /// New state, absent when the operation failed
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

#[derive(Clone, Debug, Default)]
pub struct ReadResponse {
    pub state: Value,
    pub diagnostics: Diagnostics,
}

#[derive(Clone, Debug, Default)]
pub struct DeleteResponse {
    pub diagnostics: Diagnostics,
}

/// Lifecycle surface of a resource type
pub trait Resource: Send + Sync {
    /// Full type name, e.g. `k8s_acid_zalan_do_postgresql_v1`
    fn metadata(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Plan-time validation of a configuration
    fn validate_config(&self, config: &Value) -> Diagnostics;

    fn create(&self, request: CreateRequest) -> ApplyResponse;

    /// Returns the stored state unchanged
    fn read(&self, request: ReadRequest) -> ReadResponse {
        ReadResponse {
            state: request.state,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Same as create; the prior state is not consulted
    fn update(&self, request: UpdateRequest) -> ApplyResponse {
        self.create(CreateRequest {
            config: request.config,
        })
    }

    /// Removal only happens in the caller's state
    fn delete(&self, _request: DeleteRequest) -> DeleteResponse {
        DeleteResponse::default()
    }
}
