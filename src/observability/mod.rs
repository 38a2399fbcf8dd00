//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, request spans)
//!     → metrics.rs (resolution and panic counters)
//!
//! Consumers:
//!     → stdout (full, compact or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
