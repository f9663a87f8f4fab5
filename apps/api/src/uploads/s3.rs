use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::config::S3Config;
use crate::errors::AppError;
use crate::uploads::FileStorage;

/// Stores files in an S3-compatible bucket (AWS or MinIO) as `<folder>/<key>`.
#[derive(Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    /// Static credentials and a fixed region; `endpoint` points at MinIO locally.
    pub async fn connect(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "jobtracker-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        info!("S3 client initialized (bucket: {})", config.bucket);
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl FileStorage for S3Storage {
    async fn put(
        &self,
        folder: &str,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        let object = format!("{folder}/{key}");
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object)
            .body(ByteStream::from(bytes));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload of {object} failed: {e}")))?;
        Ok(())
    }
}
