use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::core::config::Settings;

/// S3-compatible object store for exam cover images.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredObject {
    pub(crate) key: String,
    pub(crate) size: i64,
    pub(crate) sha256: String,
}

impl StorageService {
    /// Returns `None` when S3 credentials are not configured.
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let s3 = settings.s3();
        if !s3.is_configured() {
            return Ok(None);
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "examhub-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(s3.endpoint.clone())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build(),
        );

        Ok(Some(Self { client, bucket: s3.bucket.clone() }))
    }

    pub(crate) async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) async fn upload_bytes(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<StoredObject> {
        let size = bytes.len() as i64;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(StoredObject { key: key.to_string(), size, sha256 })
    }

    pub(crate) async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn object_exists(&self, key: &str) -> anyhow::Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Object key for an exam cover. The random segment keeps replaced covers from
/// being served out of caches.
pub(crate) fn cover_image_key(exam_id: i64, extension: &str) -> String {
    format!("exams/{exam_id}/cover-{}.{extension}", uuid::Uuid::new_v4().simple())
}
