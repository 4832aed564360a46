//! Metric definitions for the hearing state layer.
//!
//! All metrics follow Prometheus naming conventions:
//! - `hearing_` prefix for this layer
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `layer`: 2 values (local, distributed)
//! - `entity`: 4 values (conference, invitation, index, layout)
//! - `outcome`: 2 values (acquired, held)
//!
//! Entity ids are never used as labels.

use metrics::counter;

/// Cache layer label for the process-local conference map.
pub const LAYER_LOCAL: &str = "local";

/// Cache layer label for the shared distributed store.
pub const LAYER_DISTRIBUTED: &str = "distributed";

/// Record a cache hit.
///
/// Metric: `hearing_cache_hits_total`
/// Labels: `layer`, `entity`
pub fn record_cache_hit(layer: &'static str, entity: &'static str) {
    counter!("hearing_cache_hits_total", "layer" => layer, "entity" => entity).increment(1);
}

/// Record a cache miss (the entity had to be fetched or reported absent).
///
/// Metric: `hearing_cache_misses_total`
/// Labels: `entity`
pub fn record_cache_miss(entity: &'static str) {
    counter!("hearing_cache_misses_total", "entity" => entity).increment(1);
}

/// Record a stored payload that failed to decode and was treated as a miss.
///
/// Metric: `hearing_cache_decode_failures_total`
/// Labels: `entity`
pub fn record_decode_failure(entity: &'static str) {
    counter!("hearing_cache_decode_failures_total", "entity" => entity).increment(1);
}

/// Record a distributed lock acquisition attempt outcome.
///
/// Metric: `hearing_lock_acquisitions_total`
/// Labels: `outcome` (`acquired` | `held`)
pub fn record_lock_outcome(acquired: bool) {
    let outcome = if acquired { "acquired" } else { "held" };
    counter!("hearing_lock_acquisitions_total", "outcome" => outcome).increment(1);
}

/// Record an upstream conference fetch (cache could not serve the read).
///
/// Metric: `hearing_upstream_fetches_total`
pub fn record_upstream_fetch() {
    counter!("hearing_upstream_fetches_total").increment(1);
}
