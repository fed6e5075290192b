//! Prometheus metrics for the provider
//!
//! Counters track lifecycle operations per resource type. Nothing is served
//! over HTTP; the CLI prints the text exposition on request.

pub mod prometheus;

pub use self::prometheus::*;
