use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::{
    conf::settings,
    prelude::{Error, Result},
};

/// Builds the S3 client from settings. Path-style addressing is forced so
/// the client works against MinIO endpoints without bucket DNS.
pub async fn build_client() -> Client {
    let credentials = Credentials::new(
        &settings.s3_access_key,
        &settings.s3_secret_key,
        None,
        None,
        "resumind-static",
    );
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(settings.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&settings.s3_endpoint)
        .load()
        .await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();
    Client::from_conf(s3_config)
}

#[async_trait::async_trait]
pub trait S3Ops {
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
    async fn retrieve_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, String)>;
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()>;
}

#[async_trait::async_trait]
impl S3Ops for Client {
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let constraint =
            aws_sdk_s3::types::BucketLocationConstraint::from(settings.s3_region.as_str());
        let cfg = aws_sdk_s3::types::CreateBucketConfiguration::builder()
            .location_constraint(constraint)
            .build();
        let create = self
            .create_bucket()
            .create_bucket_configuration(cfg)
            .bucket(bucket)
            .send()
            .await;
        match create {
            Ok(_) => {
                tracing::info!("created bucket {bucket}");
                Ok(())
            }
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|se| se.is_bucket_already_exists() || se.is_bucket_already_owned_by_you())
                    == Some(true)
                {
                    Ok(())
                } else {
                    Err(Error::Storage(format!(
                        "failed to create bucket {bucket}: {}",
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("s3 put_object {key}: {}", DisplayErrorContext(&e));
                Error::Storage(format!("failed to store object {key}"))
            })?;
        Ok(())
    }

    async fn retrieve_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, String)> {
        let output = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("s3 get_object {key}: {}", DisplayErrorContext(&e));
                Error::Storage(format!("failed to retrieve object {key}"))
            })?;
        let content_type = output
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("failed to read object body {key}: {e}")))?
            .into_bytes()
            .to_vec();
        Ok((data, content_type))
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("s3 delete_object {key}: {}", DisplayErrorContext(&e));
                Error::Storage(format!("failed to delete object {key}"))
            })?;
        Ok(())
    }
}
