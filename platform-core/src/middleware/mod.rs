pub mod identity;
pub mod metrics;
pub mod tracing;
