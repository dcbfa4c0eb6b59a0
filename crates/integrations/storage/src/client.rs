//! S3-compatible object storage client.

use std::sync::Arc;

use bytes::Bytes;
use common::{require_non_blank, run_with_timeout, AppError, AppResult, StorageConfig};
use object_store::aws::AmazonS3Builder;
use object_store::signer::Signer;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};

use crate::builders::{Download, ObjectExists, RemoveObject, Sign, Upload};

/// Map store failures, logging anything other than a missing object.
///
/// A missing object becomes `NotFound`.
fn storage_error(operation: &str, err: object_store::Error) -> AppError {
    match err {
        object_store::Error::NotFound { .. } => AppError::NotFound,
        other => {
            tracing::error!("Object storage {} failed: {}", operation, other);
            AppError::Storage(other)
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub key: String,
    pub e_tag: Option<String>,
    pub version: Option<String>,
}

/// A fetched object.
#[derive(Debug, Clone)]
pub struct DownloadedObject {
    pub key: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub size: u64,
}

/// Object storage client over any [`ObjectStore`], with optional URL signing.
#[derive(Debug, Clone)]
pub struct S3Client {
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
}

impl S3Client {
    /// Wrap a store that cannot sign URLs.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            signer: None,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build an S3 client from bucket, region, endpoint and credentials.
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        require_non_blank(&config.bucket, "bucket")?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_allow_http(config.allow_http);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(key_id) = &config.access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }

        let s3 = Arc::new(builder.build()?);
        tracing::info!(bucket = %config.bucket, region = %config.region, "S3 client configured");

        Ok(Self {
            store: s3.clone(),
            signer: Some(s3),
        })
    }

    pub async fn upload(&self, cmd: Upload) -> AppResult<UploadResult> {
        let mut options = PutOptions::default();
        if let Some(content_type) = cmd.content_type {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, AttributeValue::from(content_type));
            options.attributes = attributes;
        }
        let size = cmd.body.len();

        run_with_timeout(cmd.timeout.get(), async {
            let result = self
                .store
                .put_opts(&cmd.path, PutPayload::from(cmd.body), options)
                .await
                .map_err(|e| storage_error("upload", e))?;
            tracing::debug!(key = %cmd.key, size, "Object uploaded");
            Ok(UploadResult {
                key: cmd.key,
                e_tag: result.e_tag,
                version: result.version,
            })
        })
        .await
    }

    pub async fn download(&self, cmd: Download) -> AppResult<DownloadedObject> {
        run_with_timeout(cmd.timeout.get(), async {
            let result = self
                .store
                .get(&cmd.path)
                .await
                .map_err(|e| storage_error("download", e))?;
            let content_type = result
                .attributes
                .get(&Attribute::ContentType)
                .map(|value| value.as_ref().to_string());
            let size = result.meta.size;
            let bytes = result
                .bytes()
                .await
                .map_err(|e| storage_error("download", e))?;

            Ok(DownloadedObject {
                key: cmd.key,
                bytes,
                content_type,
                size,
            })
        })
        .await
    }

    /// Presigned URL for the object; requires a signing-capable store.
    pub async fn sign(&self, cmd: Sign) -> AppResult<String> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| AppError::internal("storage backend cannot sign URLs"))?;

        run_with_timeout(cmd.timeout.get(), async {
            let url = signer
                .signed_url(cmd.method.as_http(), &cmd.path, cmd.expires_in)
                .await
                .map_err(|e| storage_error("sign", e))?;
            Ok(url.to_string())
        })
        .await
    }

    pub async fn remove(&self, cmd: RemoveObject) -> AppResult<()> {
        run_with_timeout(cmd.timeout.get(), async {
            self.store
                .delete(&cmd.path)
                .await
                .map_err(|e| storage_error("remove", e))
        })
        .await
    }

    pub async fn exists(&self, cmd: ObjectExists) -> AppResult<bool> {
        run_with_timeout(cmd.timeout.get(), async {
            match self.store.head(&cmd.path).await {
                Ok(_) => Ok(true),
                Err(object_store::Error::NotFound { .. }) => Ok(false),
                Err(e) => Err(storage_error("exists", e)),
            }
        })
        .await
    }
}
