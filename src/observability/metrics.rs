//! Metrics collection.
//!
//! # Metrics
//! - `trellis_session_loads_total` (counter): sessions loaded from connections
//! - `trellis_session_stores_total` (counter): sessions written to cookies
//! - `trellis_storage_hits_total` / `trellis_storage_misses_total` (counters)
//! - `trellis_storage_evictions_total` (counter): lazily evicted entries
//! - `trellis_storage_entries` (gauge): current entry count

use metrics::{counter, gauge};

pub fn record_session_load() {
    counter!("trellis_session_loads_total").increment(1);
}

pub fn record_session_store() {
    counter!("trellis_session_stores_total").increment(1);
}

pub fn record_storage_hit() {
    counter!("trellis_storage_hits_total").increment(1);
}

pub fn record_storage_miss() {
    counter!("trellis_storage_misses_total").increment(1);
}

pub fn record_storage_eviction() {
    counter!("trellis_storage_evictions_total").increment(1);
}

pub fn record_storage_size(entries: usize) {
    gauge!("trellis_storage_entries").set(entries as f64);
}
