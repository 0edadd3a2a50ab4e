//! Shared data models for the ytclip service.
//!
//! This crate provides Serde-serializable types for:
//! - Clip requests and job identifiers
//! - Clip time parsing and validated clip windows
//! - Stream descriptors and source metadata
//! - Quality selection
//! - Encoding configuration

pub mod clip;
pub mod encoding;
pub mod quality;
pub mod stream;
pub mod timestamp;

// Re-export common types
pub use clip::{ClipJobId, ClipRequest, CLIP_EXTENSION};
pub use encoding::EncodingConfig;
pub use quality::Quality;
pub use stream::{quality_options, QualityOption, SourceInfo, StreamDescriptor};
pub use timestamp::{parse_clip_time, ClipWindow, TimestampError};
