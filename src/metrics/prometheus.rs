//! Prometheus metrics definitions and text exposition

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

use crate::{Error, Result};

lazy_static::lazy_static! {
    /// Total number of lifecycle operations
    pub static ref OPERATIONS: CounterVec = register_counter_vec!(
        "k8s_crd_provider_operations_total",
        "Total number of lifecycle operations",
        &["resource", "operation"]
    ).unwrap();

    /// Total number of lifecycle operations that returned errors
    pub static ref OPERATION_ERRORS: CounterVec = register_counter_vec!(
        "k8s_crd_provider_operation_errors_total",
        "Total number of lifecycle operations that returned errors",
        &["resource", "operation"]
    ).unwrap();

    /// Manifest rendering duration histogram
    pub static ref RENDER_DURATION: HistogramVec = register_histogram_vec!(
        "k8s_crd_provider_render_duration_seconds",
        "Duration of manifest rendering in seconds",
        &["resource"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]
    ).unwrap();

    /// Resource types currently registered
    pub static ref REGISTERED_RESOURCES: Gauge = register_gauge!(
        "k8s_crd_provider_registered_resources",
        "Number of registered resource types"
    ).unwrap();
}

/// Encode every registered metric in the Prometheus text format
pub fn gather() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| Error::SerializationError(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| Error::SerializationError(format!("Failed to encode metrics: {}", e)))
}
