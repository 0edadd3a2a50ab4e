//! S3-compatible object store client.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Default region; S3-compatible providers such as R2 accept "auto".
pub const DEFAULT_REGION: &str = "auto";

/// Uploads finished clips and hands back a publicly reachable URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path` under `key` and return its public URL.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str)
        -> StorageResult<String>;
}

/// Configuration for [`S3Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Custom S3 API endpoint (R2, MinIO, ...); AWS when unset
    pub endpoint_url: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    pub region: String,
    /// Base URL objects are publicly served from
    pub public_base_url: Option<String>,
}

impl S3Config {
    /// Create config from environment variables.
    ///
    /// Fails when any of the bucket name or credential variables is missing.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StorageResult<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StorageError::config_error(format!("{} not set", name)))
        };
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bucket_name: required("STORAGE_BUCKET_NAME")?,
            access_key_id: required("STORAGE_ACCESS_KEY_ID")?,
            secret_access_key: required("STORAGE_SECRET_ACCESS_KEY")?,
            endpoint_url: optional("STORAGE_ENDPOINT_URL"),
            region: optional("STORAGE_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            public_base_url: optional("STORAGE_PUBLIC_BASE_URL"),
        })
    }

    /// Public URL of an object.
    ///
    /// Uses `public_base_url` when set, otherwise the path-style URL on the
    /// custom endpoint, otherwise the AWS virtual-hosted URL.
    pub fn public_url(&self, key: &str) -> String {
        let key = urlencoding::encode(key);
        match (&self.public_base_url, &self.endpoint_url) {
            (Some(base), _) => format!("{}/{}", base.trim_end_matches('/'), key),
            (None, Some(endpoint)) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket_name,
                key
            ),
            (None, None) => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket_name, self.region, key
            ),
        }
    }
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: S3Config,
}

impl S3Store {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "ytclip",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket_name
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        debug!("Uploading {} to {}", path.display(), key);

        if !path.exists() {
            return Err(StorageError::not_found(path.display().to_string()));
        }

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let url = self.config.public_url(key);
        info!(bucket = %self.config.bucket_name, key, "Uploaded {}", path.display());
        Ok(url)
    }
}
