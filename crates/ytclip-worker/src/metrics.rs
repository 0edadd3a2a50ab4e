//! Clip pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder every call is a no-op.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "ytclip_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "ytclip_jobs_failed_total";
    pub const PUBLISH_DEGRADED_TOTAL: &str = "ytclip_publish_degraded_total";

    pub const TRANSCODE_DURATION_SECONDS: &str = "ytclip_transcode_duration_seconds";
    pub const TRANSCODE_ATTEMPTS_TOTAL: &str = "ytclip_transcode_attempts_total";

    pub const GATE_WAIT_SECONDS: &str = "ytclip_gate_wait_seconds";
    pub const GATE_SLOTS_IN_USE: &str = "ytclip_gate_slots_in_use";
}

/// Record a published clip.
pub fn record_job_completed(hosted_remotely: bool) {
    let labels = [(
        "destination",
        if hosted_remotely { "remote" } else { "local" }.to_string(),
    )];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record a failed clip job.
pub fn record_job_failed(category: &str) {
    let labels = [("category", category.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record an upload that fell back to the local URL.
pub fn record_publish_degraded() {
    counter!(names::PUBLISH_DEGRADED_TOTAL).increment(1);
}

/// Record transcode wall time and the number of attempts it took.
pub fn record_transcode(duration_secs: f64, attempts: u32, success: bool) {
    let labels = [("outcome", if success { "success" } else { "failure" }.to_string())];
    histogram!(names::TRANSCODE_DURATION_SECONDS, &labels).record(duration_secs);
    counter!(names::TRANSCODE_ATTEMPTS_TOTAL, &labels).increment(u64::from(attempts));
}

/// Record time spent waiting for a gate slot.
pub fn record_gate_wait(wait_secs: f64) {
    histogram!(names::GATE_WAIT_SECONDS).record(wait_secs);
}

/// Update the gate occupancy gauge.
pub fn set_gate_in_use(in_use: usize) {
    gauge!(names::GATE_SLOTS_IN_USE).set(in_use as f64);
}
