//! TCAP Telemetry
//!
//! Tracing setup and in-process metric primitives shared by the SRT engine
//! and its tools.

mod config;
mod tracing_setup;
mod metrics;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;
pub use metrics::{Counter, Histogram, HistogramSummary};

/// Initialize tracing for a tool from the environment
pub fn init(service_name: &str) -> Result<TelemetryConfig, TelemetryError> {
    let config = TelemetryConfig::from_env(service_name);
    init_tracing(&config)?;
    Ok(config)
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    #[error("Invalid log filter: {0}")]
    Filter(String),
}
