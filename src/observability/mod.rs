//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Engines call cheap `record_*` free functions; recorder wiring stays
//!   in this module
//! - Log level comes from config, overridable via `RUST_LOG`

pub mod logging;
pub mod metrics;
