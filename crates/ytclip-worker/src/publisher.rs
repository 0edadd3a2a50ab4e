//! Publishing finished clips.
//!
//! With an object store configured the clip is uploaded and the local copy
//! removed in the background. Without one, or when the upload fails, the clip
//! stays on disk and is served from `/download/<file>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use ytclip_models::ClipJobId;
use ytclip_storage::ObjectStore;

use crate::metrics;

/// Route prefix for locally served clips.
pub const DOWNLOAD_ROUTE: &str = "/download";
/// Content type of every clip.
pub const CLIP_CONTENT_TYPE: &str = "video/mp4";

/// Where a clip ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub download_url: String,
    pub hosted_remotely: bool,
    pub cleanup_scheduled: bool,
    /// Set when an upload was attempted and failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A [`PublishResult`] plus the handle of the background cleanup, if any.
#[derive(Debug)]
pub struct PublishOutcome {
    pub result: PublishResult,
    pub cleanup: Option<JoinHandle<()>>,
}

/// Chooses between remote hosting and the local download route.
#[derive(Clone, Default)]
pub struct Publisher {
    store: Option<Arc<dyn ObjectStore>>,
}

impl Publisher {
    pub fn new(store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { store }
    }

    /// Publisher that always serves clips locally.
    pub fn local_only() -> Self {
        Self { store: None }
    }

    pub fn has_remote_store(&self) -> bool {
        self.store.is_some()
    }

    /// Local download URL for a job's clip.
    pub fn local_url(job_id: &ClipJobId) -> String {
        format!("{}/{}", DOWNLOAD_ROUTE, job_id.file_name())
    }

    /// Publish the clip at `path`. Never fails; upload errors degrade to the
    /// local URL and keep the file.
    pub async fn publish(&self, path: &Path, job_id: &ClipJobId) -> PublishOutcome {
        let local = || PublishResult {
            download_url: Self::local_url(job_id),
            hosted_remotely: false,
            cleanup_scheduled: false,
            warning: None,
        };

        let Some(store) = &self.store else {
            return PublishOutcome {
                result: local(),
                cleanup: None,
            };
        };

        let key = job_id.file_name();
        match store.upload_file(path, &key, CLIP_CONTENT_TYPE).await {
            Ok(url) => {
                info!(job_id = %job_id, key = %key, "Clip uploaded to object storage");
                PublishOutcome {
                    result: PublishResult {
                        download_url: url,
                        hosted_remotely: true,
                        cleanup_scheduled: true,
                        warning: None,
                    },
                    cleanup: Some(schedule_cleanup(path.to_path_buf())),
                }
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    error = %e,
                    "Upload failed, falling back to local download"
                );
                metrics::record_publish_degraded();
                PublishOutcome {
                    result: PublishResult {
                        warning: Some(format!("Upload failed, serving clip locally: {}", e)),
                        ..local()
                    },
                    cleanup: None,
                }
            }
        }
    }
}

/// Remove a local file in the background; failures are only logged.
fn schedule_cleanup(path: PathBuf) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = %path.display(), "Removed local copy of uploaded clip"),
            Err(e) => warn!(path = %path.display(), "Failed to remove local clip: {}", e),
        }
    })
}
