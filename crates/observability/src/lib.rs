//! # kanalfunk-observability
//!
//! Observability-Crate fuer Kanalfunk:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured JSON Logging via tracing-subscriber
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, HealthState, HealthStatus};
pub use logging::{logging_initialisieren, mit_vorlaeufigem_logging};
pub use metrics::{metrics_router, KanalfunkMetrics};
pub use middleware::{request_timing_layer, timing_middleware};
