//! Object storage for finished clips.
//!
//! This crate provides:
//! - The `ObjectStore` seam used by the publisher
//! - An S3-compatible implementation (AWS, R2, MinIO)

pub mod client;
pub mod error;

pub use client::{ObjectStore, S3Config, S3Store};
pub use error::{StorageError, StorageResult};
