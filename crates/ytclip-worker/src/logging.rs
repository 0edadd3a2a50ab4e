//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for clip jobs with contextual
//! information.

use tracing::{error, info, warn, Span};
use ytclip_models::ClipJobId;

/// Job logger for structured logging with consistent formatting.
///
/// Every event carries the job ID and operation as tracing fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a specific job and operation.
    pub fn new(job_id: &ClipJobId, operation: &str) -> Self {
        Self::from_string(job_id.as_str(), operation)
    }

    /// Create a new job logger from a string job ID.
    pub fn from_string(job_id: &str, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a state transition.
    pub fn log_transition(&self, from: &str, to: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            from,
            to,
            "Job state: {} -> {}", from, to
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log a terminal failure with its category.
    pub fn log_error(&self, category: &str, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            category,
            "Job failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
