//! Observability for the hearing state layer.
//!
//! Structured logging uses `tracing` directly at each call site; this
//! module holds the metric definitions. Only the `metrics` facade is used
//! here - installing a recorder/exporter is the hosting service's job.

pub mod metrics;
