//! Kubernetes CRD provider
//!
//! Exposes Kubernetes Custom Resource Definitions as Terraform-style
//! resources. Each served CRD version becomes a resource type whose create
//! and update render a Kubernetes manifest into the caller's state; nothing
//! is ever sent to a cluster.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod crd;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod validators;

pub use error::{Error, Result};
