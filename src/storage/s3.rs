use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use tokio::runtime::Runtime;

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::storage::blob::{BlobStore, normalize_key};

/// Region used when neither the caller nor `AWS_REGION` names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Blob store backed by an S3 bucket (or any [`ObjectStore`]).
///
/// Requests are signed by `object_store`; the async calls run on a private current-thread runtime
/// so the store can sit behind the blocking [`BlobStore`] API.
pub struct S3BlobStore {
    inner: Arc<dyn ObjectStore>,
    runtime: Runtime,
    location: String,
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl S3BlobStore {
    /// Bucket `bucket` in `region` (else `AWS_REGION`, else [`DEFAULT_REGION`]).
    ///
    /// Credentials, session token and custom endpoint come from the usual `AWS_*` variables.
    pub fn from_env(bucket: &str, region: Option<&str>) -> VersecastResult<Self> {
        let bucket = bucket.trim();
        if bucket.is_empty() {
            return Err(VersecastError::validation("S3 bucket name must be non-empty"));
        }
        let region = region
            .map(str::to_owned)
            .or_else(|| std::env::var("AWS_REGION").ok())
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_owned());

        let s3 = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&region)
            .build()
            .map_err(|e| VersecastError::store(format!("configure s3://{bucket}: {e}")))?;
        tracing::debug!(bucket, region = %region, "s3 store configured");
        Self::with_store(Arc::new(s3), format!("s3://{bucket}"))
    }

    /// Wrap an already built object store; `location` is used in logs and errors.
    pub fn with_store(
        inner: Arc<dyn ObjectStore>,
        location: impl Into<String>,
    ) -> VersecastResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| VersecastError::store(format!("start object store runtime: {e}")))?;
        Ok(Self {
            inner,
            runtime,
            location: location.into(),
        })
    }

    fn path(key: &str) -> VersecastResult<ObjectPath> {
        let key = normalize_key(key)?;
        ObjectPath::parse(&key)
            .map_err(|e| VersecastError::store(format!("object key {key:?}: {e}")))
    }
}

impl BlobStore for S3BlobStore {
    fn get(&self, key: &str) -> VersecastResult<Option<Vec<u8>>> {
        let path = Self::path(key)?;
        let fetched = self.runtime.block_on(async {
            match self.inner.get(&path).await {
                Ok(found) => found.bytes().await.map(|b| Some(b.to_vec())),
                Err(object_store::Error::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        });
        fetched.map_err(|e| VersecastError::store(format!("GET {}/{path}: {e}", self.location)))
    }

    fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> VersecastResult<()> {
        let path = Self::path(key)?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_owned().into());
        let opts = PutOptions {
            attributes,
            ..PutOptions::default()
        };

        let size = body.len();
        self.runtime
            .block_on(self.inner.put_opts(&path, PutPayload::from(body), opts))
            .map_err(|e| VersecastError::store(format!("PUT {}/{path}: {e}", self.location)))?;
        tracing::debug!(key = %path, bytes = size, content_type, "object stored");
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/s3.rs"]
mod tests;
