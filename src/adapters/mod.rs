//! Adapters from resource state to Kubernetes manifests

pub mod manifest;

pub use manifest::{build_manifest, render, Manifest};
