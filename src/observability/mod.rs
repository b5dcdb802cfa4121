//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Whatever metrics recorder the embedding binary installs
//! ```
//!
//! # Design Decisions
//! - The core only records; recorder/exporter installation belongs to
//!   the embedding binary
//! - Metric updates are cheap atomic operations, safe on the hot path

pub mod logging;
pub mod metrics;
