//! Object store gateway (C2): size-capped upload and download of opaque byte
//! blobs keyed by path. The pipeline core never talks to the S3 SDK
//! directly — it depends on the `ObjectStore` trait, so tests can swap in an
//! in-memory fake without touching AWS.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use fishsub_core::{Error, Result};

/// Blobs larger than this are rejected with `Error::InvalidInput` before any
/// network call is made (spec §4.2, §8 boundary behaviour).
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;
    async fn download(&self, key: &str) -> Result<Bytes>;
}

/// S3-backed implementation. Retries on transient provider errors are
/// delegated to the SDK's own retry configuration (spec §4.2: up to 5
/// standard-mode attempts), not reimplemented here.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds a client configured with the standard retry mode at 5 attempts,
    /// using the ambient AWS config (region, credentials) from the
    /// environment.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let shared_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .retry_config(
                aws_sdk_s3::config::retry::RetryConfig::standard().with_max_attempts(5),
            )
            .build();
        Self::new(aws_sdk_s3::Client::from_conf(s3_config), bucket)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self, bytes), fields(key, len = bytes.len()))]
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(Error::InvalidInput(format!(
                "blob exceeds max upload size of {MAX_UPLOAD_BYTES} bytes"
            )));
        }

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        Ok(key.to_string())
    }

    #[tracing::instrument(skip(self), fields(key))]
    async fn download(&self, key: &str) -> Result<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Storage(anyhow::anyhow!(e.to_string())))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(anyhow::anyhow!(e.to_string())))?;

        Ok(data.into_bytes())
    }
}

/// In-memory fake used by pipeline-stage tests (and by this crate's own
/// tests below), so C5/C6 tests don't require a real bucket.
pub mod testing {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    pub struct InMemoryObjectStore {
        blobs: DashMap<String, Bytes>,
    }

    #[async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn upload(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<String> {
            if bytes.len() as u64 > MAX_UPLOAD_BYTES {
                return Err(Error::InvalidInput("blob too large".into()));
            }
            self.blobs.insert(key.to_string(), bytes);
            Ok(key.to_string())
        }

        async fn download(&self, key: &str) -> Result<Bytes> {
            self.blobs
                .get(key)
                .map(|b| b.clone())
                .ok_or_else(|| Error::Storage(anyhow::anyhow!("no such key: {key}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::InMemoryObjectStore;
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn upload_rejects_oversized_blobs() {
        let store = InMemoryObjectStore::default();
        let oversized = Bytes::from(vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize]);
        let err = store
            .upload("some/key", oversized, "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn upload_then_download_roundtrips() {
        let store = InMemoryObjectStore::default();
        store
            .upload("docs/a.pdf", Bytes::from_static(b"hello"), "application/pdf")
            .await
            .unwrap();
        let bytes = store.download("docs/a.pdf").await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn download_missing_key_is_storage_error() {
        let store = InMemoryObjectStore::default();
        let err = store.download("missing").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
