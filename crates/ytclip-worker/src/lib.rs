//! Clip job processing.
//!
//! This crate provides:
//! - The clip job state machine and pipeline
//! - The admission gate bounding concurrent transcodes
//! - Publishing to object storage or the local download route
//! - Pipeline configuration, job logging and metrics

pub mod config;
pub mod error;
pub mod gate;
pub mod job;
pub mod logging;
pub mod metrics;
pub mod publisher;

pub use config::ClipConfig;
pub use error::{ClipError, ClipResult};
pub use gate::{AdmissionGate, GatePermit};
pub use job::{ClipJob, ClipJobState, ClipOutcome, ClipPipeline, UNKNOWN_RESOLUTION};
pub use logging::JobLogger;
pub use publisher::{PublishOutcome, PublishResult, Publisher};
